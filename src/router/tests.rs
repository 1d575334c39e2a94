use super::*;
use crate::server::Request;
use http::Method;

fn named(name: &'static str) -> Handler {
    handler(move |ctx| ctx.text(200, name))
}

fn body(router: &LiveRouter, method: Method, target: &str) -> (u16, String) {
    let res = router.dispatch(Request::new(method, target));
    (res.status, String::from_utf8_lossy(&res.body).into_owned())
}

#[test]
fn test_simple_route() {
    let mut router = LiveRouter::new();
    router.handle(Method::GET, "/health", vec![named("health")]).unwrap();
    assert_eq!(body(&router, Method::GET, "/health"), (200, "health".into()));
    assert_eq!(router.len(), 1);
}

#[test]
fn test_root_route() {
    let mut router = LiveRouter::new();
    router.handle(Method::GET, "/", vec![named("root")]).unwrap();
    assert_eq!(body(&router, Method::GET, "/"), (200, "root".into()));
    assert_eq!(body(&router, Method::GET, "").0, 200);
}

#[test]
fn test_named_parameters() {
    let mut router = LiveRouter::new();
    router
        .handle(Method::GET, "/users/:user_id/posts/:post_id", vec![named("post")])
        .unwrap();
    let m = router.route(&Method::GET, "/users/123/posts/456").unwrap();
    assert_eq!(m.get_path_param("user_id"), Some("123"));
    assert_eq!(m.get_path_param("post_id"), Some("456"));
}

#[test]
fn test_static_beats_named() {
    let mut router = LiveRouter::new();
    router.handle(Method::GET, "/users/:id", vec![named("by-id")]).unwrap();
    router.handle(Method::GET, "/users/me", vec![named("me")]).unwrap();
    assert_eq!(body(&router, Method::GET, "/users/me").1, "me");
    assert_eq!(body(&router, Method::GET, "/users/7").1, "by-id");
}

#[test]
fn test_backtracks_from_dead_static_branch() {
    let mut router = LiveRouter::new();
    router.handle(Method::GET, "/a/b/c", vec![named("static")]).unwrap();
    router.handle(Method::GET, "/a/:x/d", vec![named("param")]).unwrap();
    let m = router.route(&Method::GET, "/a/b/d").unwrap();
    assert_eq!(m.route.pattern, "/a/:x/d");
    assert_eq!(m.get_path_param("x"), Some("b"));
}

#[test]
fn test_different_param_names_same_position() {
    let mut router = LiveRouter::new();
    router.handle(Method::GET, "/users/:user_id/posts", vec![named("posts")]).unwrap();
    router.handle(Method::GET, "/users/:id/comments", vec![named("comments")]).unwrap();

    let posts = router.route(&Method::GET, "/users/1/posts").unwrap();
    assert_eq!(posts.get_path_param("user_id"), Some("1"));
    assert!(posts.get_path_param("id").is_none());

    let comments = router.route(&Method::GET, "/users/2/comments").unwrap();
    assert_eq!(comments.get_path_param("id"), Some("2"));
    assert!(comments.get_path_param("user_id").is_none());
}

#[test]
fn test_catch_all_captures_remainder() {
    let mut router = LiveRouter::new();
    router.handle(Method::GET, "/files/*filepath", vec![named("files")]).unwrap();
    let m = router.route(&Method::GET, "/files/a/b/c.txt").unwrap();
    assert_eq!(m.get_path_param("filepath"), Some("a/b/c.txt"));
    let m = router.route(&Method::GET, "/files").unwrap();
    assert_eq!(m.get_path_param("filepath"), Some(""));
}

#[test]
fn test_catch_all_must_be_last() {
    let mut router = LiveRouter::new();
    let err = router
        .handle(Method::GET, "/files/*path/meta", vec![named("x")])
        .unwrap_err();
    assert!(matches!(err, RouterError::InvalidPath { .. }));
    assert!(router.is_empty());
}

#[test]
fn test_duplicate_method_and_path_conflicts() {
    let mut router = LiveRouter::new();
    router.handle(Method::GET, "/items/:id", vec![named("a")]).unwrap();
    router.handle(Method::POST, "/items/:id", vec![named("b")]).unwrap();
    let err = router.handle(Method::GET, "/items/:id", vec![named("c")]).unwrap_err();
    assert_eq!(
        err,
        RouterError::Conflict {
            method: Method::GET,
            path: "/items/:id".into()
        }
    );
    assert_eq!(router.len(), 2);
}

#[test]
fn test_renamed_param_with_same_shape_conflicts() {
    let mut router = LiveRouter::new();
    router.handle(Method::GET, "/users/:id", vec![named("id")]).unwrap();
    let err = router.handle(Method::GET, "/users/:uid", vec![named("uid")]).unwrap_err();
    assert_eq!(
        err,
        RouterError::Conflict {
            method: Method::GET,
            path: "/users/:uid".into()
        }
    );

    // other methods and other shapes under the new name stay available
    router.handle(Method::DELETE, "/users/:uid", vec![named("del")]).unwrap();
    router.handle(Method::GET, "/users/:uid/likes", vec![named("likes")]).unwrap();
    let err = router
        .handle(Method::GET, "/users/:key/likes", vec![named("dup")])
        .unwrap_err();
    assert!(matches!(err, RouterError::Conflict { .. }));

    assert_eq!(body(&router, Method::GET, "/users/7").1, "id");
    assert_eq!(body(&router, Method::DELETE, "/users/7").1, "del");
    assert_eq!(body(&router, Method::GET, "/users/7/likes").1, "likes");
    assert_eq!(router.len(), 3);
}

#[test]
fn test_method_filtering_and_404() {
    let mut router = LiveRouter::new();
    router.handle(Method::GET, "/items", vec![named("list")]).unwrap();
    assert_eq!(body(&router, Method::PUT, "/items").0, 404);
    assert_eq!(body(&router, Method::GET, "/posts").0, 404);
}

#[test]
fn test_prefix_is_prepended() {
    let mut router = LiveRouter::with_prefix("api/");
    assert_eq!(router.prefix(), "/api");
    router.handle(Method::GET, "/users", vec![named("users")]).unwrap();
    router.handle(Method::GET, "/", vec![named("index")]).unwrap();
    assert_eq!(body(&router, Method::GET, "/api/users").1, "users");
    assert_eq!(body(&router, Method::GET, "/api").1, "index");
    assert_eq!(body(&router, Method::GET, "/users").0, 404);
}

#[test]
fn test_chain_stops_on_abort() {
    let mut router = LiveRouter::new();
    let guard = handler(|ctx| {
        if ctx.header("x-allow").is_none() {
            ctx.abort_with_json(401, &serde_json::json!({"error": "denied"}));
        }
    });
    router
        .handle(Method::GET, "/secret", vec![guard, named("secret")])
        .unwrap();

    assert_eq!(body(&router, Method::GET, "/secret").0, 401);
    let res = router.dispatch(Request::new(Method::GET, "/secret").with_header("X-Allow", "1"));
    assert_eq!(res.body, b"secret");
}
