use roster_http::Method;

/// A matched API route. Ids are taken verbatim from the path segment and may
/// be empty; id validation happens in the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ListUsers,
    GetUser(String),
    CreateUser,
    UpdateUser(String),
    DeleteUser(String),
}

/// Maps a method and request path (without query) onto a route.
pub fn resolve(method: &Method, path: &str) -> Option<Route> {
    let rest = path.strip_prefix("/users")?;
    if rest.is_empty() || rest == "/" {
        return (*method == Method::GET).then_some(Route::ListUsers);
    }

    let rest = rest.strip_prefix('/')?;
    // One trailing slash is tolerated on every route.
    let (rest, trailing_slash) = match rest.strip_suffix('/') {
        Some(trimmed) => (trimmed, true),
        None => (rest, false),
    };
    let segments: Vec<&str> = rest.split('/').collect();

    match segments.as_slice() {
        ["create"] if *method == Method::POST => Some(Route::CreateUser),
        ["update", id] if *method == Method::PUT => Some(Route::UpdateUser(id.to_string())),
        ["remove", id] if *method == Method::DELETE => Some(Route::DeleteUser(id.to_string())),
        // `/users/update/` names the route with an empty id.
        ["update"] if *method == Method::PUT && trailing_slash => {
            Some(Route::UpdateUser(String::new()))
        }
        ["remove"] if *method == Method::DELETE && trailing_slash => {
            Some(Route::DeleteUser(String::new()))
        }
        [id] if *method == Method::GET && !id.is_empty() => Some(Route::GetUser(id.to_string())),
        _ => None,
    }
}
