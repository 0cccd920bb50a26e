pub mod models;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use library_kernel::{InitCtx, Module};
use serde_json::json;

use routes::UsersState;

/// Users module: patrons, punishment and penalties
pub struct UsersModule {
    state: UsersState,
}

impl UsersModule {
    pub fn new(state: UsersState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let known = self.state.users.find_all().await?.len();
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            known_users = known,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let user_id = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string", "format": "uuid" }
        });
        let error = json!({
            "description": "Error",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let user = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/User" } }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List users",
                        "tags": ["Users"],
                        "responses": {
                            "200": {
                                "description": "List of users",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/User" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a user",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateUser" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Created", "content": user },
                            "422": error
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a user",
                        "tags": ["Users"],
                        "parameters": [user_id],
                        "responses": {
                            "200": { "description": "User", "content": user },
                            "404": error
                        }
                    }
                },
                "/{id}/punishment": {
                    "put": {
                        "summary": "Punish or pardon a user",
                        "tags": ["Users"],
                        "parameters": [user_id],
                        "responses": {
                            "200": { "description": "User", "content": user },
                            "404": error
                        }
                    }
                },
                "/{id}/penalty": {
                    "get": {
                        "summary": "Late-return penalty owed by the user",
                        "tags": ["Lending"],
                        "parameters": [user_id],
                        "responses": {
                            "200": { "description": "Penalty amount" },
                            "404": error,
                            "422": error
                        }
                    }
                },
                "/{id}/loans": {
                    "get": {
                        "summary": "Number of books held by the user",
                        "tags": ["Lending"],
                        "parameters": [user_id],
                        "responses": { "200": { "description": "Count" }, "404": error }
                    },
                    "delete": {
                        "summary": "Clear every loan of the user",
                        "tags": ["Lending"],
                        "parameters": [user_id],
                        "responses": {
                            "200": { "description": "Books freed" },
                            "404": error,
                            "409": error
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "username": { "type": "string" },
                            "is_punished": { "type": "boolean" }
                        },
                        "required": ["id", "username", "is_punished"]
                    },
                    "CreateUser": {
                        "type": "object",
                        "properties": { "username": { "type": "string" } },
                        "required": ["username"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

/// Create a new instance of the users module
pub fn create_module(state: UsersState) -> Arc<dyn Module> {
    Arc::new(UsersModule::new(state))
}
