#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    // Tickets - JSON APIs
    pub const TICKETS: &'static str = "/api/tickets";

    // Health
    pub const HEALTH: &'static str = "/health";
}

#[derive(Debug)]
pub struct PageUrls;

impl PageUrls {
    pub const HOME: &'static str = "/";
    pub const LOGIN: &'static str = "/login";
    pub const REGISTER: &'static str = "/register";
    pub const SUBMIT: &'static str = "/submit";
    pub const TRACK: &'static str = "/track";
    pub const ABOUT: &'static str = "/about";

    // Admin shell
    pub const ADMIN: &'static str = "/admin";
    pub const ADMIN_STATISTICS: &'static str = "/admin/statistics";

    /// Landing page for accounts promoted to staff.
    pub const STAFF_HOME: &'static str = Self::ADMIN;
}
