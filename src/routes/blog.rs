//! The blog API: users, posts, and comments nested under posts.

use crate::config::blog_schemas;
use crate::controller::{ModelController, NestedController};
use crate::dispatch::{bind, App};
use crate::error::ConfigError;
use crate::model::{Database, ModelStore};
use crate::router::Router;
use crate::routes::common_routes;
use std::sync::Arc;

fn store(db: &Database, name: &str) -> Result<Arc<ModelStore>, ConfigError> {
    db.model(name).ok_or_else(|| ConfigError::MissingModel(name.to_string()))
}

/// Register the blog routes against the `User`, `Post` and `Comment` tables in `db`.
pub fn blog_routes(router: &mut Router, db: &Database) -> Result<(), ConfigError> {
    let users = Arc::new(ModelController::new(store(db, "User")?));
    let posts = Arc::new(ModelController::new(store(db, "Post")?));
    let comments = Arc::new(NestedController::new(store(db, "Comment")?, "post_id"));

    for (pattern, item, ctrl) in [("/users", "/users/<id>", &users), ("/posts", "/posts/<id>", &posts)] {
        router
            .add_handler("GET", pattern, bind(Arc::clone(ctrl), &[], |c, req, _| c.list(req)))?
            .add_handler("POST", pattern, bind(Arc::clone(ctrl), &[], |c, req, _| c.create(req)))?
            .add_handler(
                "GET",
                item,
                bind(Arc::clone(ctrl), &["id"], |c, _, args| c.retrieve(args.require("id")?)),
            )?
            .add_handler(
                "PUT",
                item,
                bind(Arc::clone(ctrl), &["id"], |c, req, args| c.update(req, args.require("id")?)),
            )?
            .add_handler(
                "DELETE",
                item,
                bind(Arc::clone(ctrl), &["id"], |c, _, args| c.destroy(args.require("id")?)),
            )?;
    }

    router
        .add_handler(
            "POST",
            "/posts/<id>/comments",
            bind(Arc::clone(&comments), &["id"], |c, req, args| {
                c.create_for_parent(req, args.require("id")?)
            }),
        )?
        .add_handler(
            "GET",
            "/posts/<id>/comments",
            bind(comments, &["id"], |c, _, args| c.list_for_parent(args.require("id")?)),
        )?;
    Ok(())
}

/// The complete blog application over the bundled schemas, with fresh empty tables.
pub fn blog_app() -> Result<App, ConfigError> {
    let db = Arc::new(Database::new(blog_schemas()?)?);
    let mut router = Router::new();
    common_routes(&mut router)?;
    blog_routes(&mut router, &db)?;
    Ok(App::new(router, db))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_the_route_table() {
        let app = blog_app().unwrap();
        let routes: Vec<(&str, &str)> = app.router().routes().collect();
        for expected in [
            ("GET", "/users"),
            ("POST", "/users"),
            ("GET", "/users/<id>"),
            ("GET", "/posts"),
            ("POST", "/posts"),
            ("GET", "/posts/<id>"),
            ("POST", "/posts/<id>/comments"),
            ("GET", "/posts/<id>/comments"),
        ] {
            assert!(routes.contains(&expected), "missing {:?}", expected);
        }
    }

    #[test]
    fn missing_model_is_reported() {
        let db = Database::default();
        let err = blog_routes(&mut Router::new(), &db).unwrap_err();
        assert!(matches!(err, ConfigError::MissingModel(name) if name == "User"));
    }
}
