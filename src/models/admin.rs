/// Collections the admin console can search, create and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminResource {
    Users,
    Customers,
    Providers,
    Services,
}

impl AdminResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminResource::Users => "users",
            AdminResource::Customers => "customers",
            AdminResource::Providers => "providers",
            AdminResource::Services => "services",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "users" | "user" => Some(AdminResource::Users),
            "customers" | "customer" => Some(AdminResource::Customers),
            "providers" | "provider" => Some(AdminResource::Providers),
            "services" | "service" => Some(AdminResource::Services),
            _ => None,
        }
    }
}
