//! Trakt endpoint table.

use crate::endpoint::Endpoint;

/// List names served by public chart endpoints. Any other list name is a
/// user list id (or `watchlist`).
pub const NON_USER_LISTS: [&str; 4] = ["anticipated", "trending", "popular", "boxoffice"];

/// List name of the authenticated watchlist.
pub const WATCHLIST: &str = "watchlist";

// Shows
/// Most anticipated shows.
pub const ANTICIPATED_SHOWS: Endpoint = Endpoint::list("anticipated_shows", "shows/anticipated");
/// Trending shows.
pub const TRENDING_SHOWS: Endpoint = Endpoint::list("trending_shows", "shows/trending");
/// Popular shows. Returned bare, wrapped under `show`.
pub const POPULAR_SHOWS: Endpoint =
    Endpoint::list("popular_shows", "shows/popular").enveloped("show");
/// Shows on the owner's watchlist.
pub const WATCHLIST_SHOWS: Endpoint =
    Endpoint::list("watchlist_shows", "sync/watchlist/shows").authenticated();
/// Shows on a user list.
pub const USER_LIST_SHOWS: Endpoint =
    Endpoint::list("user_list_shows", "users/{user}/lists/{list}/items/shows").authenticated();

// Movies
/// Most anticipated movies.
pub const ANTICIPATED_MOVIES: Endpoint =
    Endpoint::list("anticipated_movies", "movies/anticipated");
/// Trending movies.
pub const TRENDING_MOVIES: Endpoint = Endpoint::list("trending_movies", "movies/trending");
/// Popular movies. Returned bare, wrapped under `movie`.
pub const POPULAR_MOVIES: Endpoint =
    Endpoint::list("popular_movies", "movies/popular").enveloped("movie");
/// Weekend box office.
pub const BOXOFFICE_MOVIES: Endpoint = Endpoint::list("boxoffice_movies", "movies/boxoffice");
/// Movies on the owner's watchlist.
pub const WATCHLIST_MOVIES: Endpoint =
    Endpoint::list("watchlist_movies", "sync/watchlist/movies").authenticated();
/// Movies on a user list.
pub const USER_LIST_MOVIES: Endpoint =
    Endpoint::list("user_list_movies", "users/{user}/lists/{list}/items/movies").authenticated();

// Key validation and OAuth
/// Cheap public call used to check the client id.
pub const VALIDATE_API_KEY: Endpoint = Endpoint::single("validate_api_key", "shows/anticipated");
/// Device code request.
pub const DEVICE_CODE: Endpoint = Endpoint::write("device_code", "oauth/device/code");
/// Device token poll.
pub const DEVICE_TOKEN: Endpoint = Endpoint::write("device_token", "oauth/device/token");
/// Refresh-token grant.
pub const REFRESH_TOKEN: Endpoint = Endpoint::write("refresh_token", "oauth/token");
/// Identity of the bearer token.
pub const USERS_ME: Endpoint = Endpoint::single("users_me", "users/me").authenticated();

/// Chart kind a list name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind<'a> {
    /// One of [`NON_USER_LISTS`].
    Chart(&'a str),
    /// The owner's watchlist.
    Watchlist,
    /// A user list id.
    User(&'a str),
}

impl<'a> ListKind<'a> {
    /// Classifies a list name.
    pub fn parse(name: &'a str) -> Self {
        if NON_USER_LISTS.contains(&name) {
            Self::Chart(name)
        } else if name == WATCHLIST {
            Self::Watchlist
        } else {
            Self::User(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_kind() {
        assert_eq!(ListKind::parse("trending"), ListKind::Chart("trending"));
        assert_eq!(ListKind::parse("boxoffice"), ListKind::Chart("boxoffice"));
        assert_eq!(ListKind::parse("watchlist"), ListKind::Watchlist);
        assert_eq!(ListKind::parse("my-favs"), ListKind::User("my-favs"));
    }

    #[test]
    fn test_auth_requirements() {
        assert!(WATCHLIST_SHOWS.requires_auth);
        assert!(USER_LIST_MOVIES.requires_auth);
        assert!(!TRENDING_MOVIES.requires_auth);
        assert_eq!(POPULAR_MOVIES.envelope, Some("movie"));
        assert_eq!(POPULAR_SHOWS.envelope, Some("show"));
    }
}
