//! Storage keys shared by every component that reads or writes the persisted
//! store.

/// A logical collection persisted as one JSON blob under a fixed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    AdminProducts,
    CartItems,
    Favorites,
}

impl Collection {
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Collection::AdminProducts => "adminProducts",
            Collection::CartItems => "cartItems",
            Collection::Favorites => "favorites",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// Keys holding login/session state, one plain string value each.
pub mod session {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const IS_LOGGED_IN: &str = "isLoggedIn";
    pub const USER_EMAIL: &str = "userEmail";
    pub const USER_NAME: &str = "userName";
    pub const USER_FIRST_NAME: &str = "userFirstName";
    pub const USER_LAST_NAME: &str = "userLastName";
    pub const USER_ID: &str = "userId";
    pub const USER_DATE_JOINED: &str = "userDateJoined";

    /// Every session key; logout removes all of them.
    pub const ALL: [&str; 9] = [
        ACCESS_TOKEN,
        REFRESH_TOKEN,
        IS_LOGGED_IN,
        USER_EMAIL,
        USER_NAME,
        USER_FIRST_NAME,
        USER_LAST_NAME,
        USER_ID,
        USER_DATE_JOINED,
    ];
}
