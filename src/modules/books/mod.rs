pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod rules;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use library_kernel::{InitCtx, Module};
use serde_json::json;

use service::BookService;

/// Books module: catalogue, lending and reporting endpoints
pub struct BooksModule {
    service: Arc<BookService>,
}

impl BooksModule {
    pub fn new(service: Arc<BookService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let policy = self.service.rules().policy();
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            loan_period_days = policy.loan_period_days,
            penalty_grace_months = policy.penalty_grace_months,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_id = json!({
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
        let book_dto = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/BookDto" } }
        });
        let book = json!({
            "application/json": { "schema": { "$ref": "#/components/schemas/Book" } }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/BookDto" }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Insert a book",
                        "tags": ["Books"],
                        "requestBody": { "required": true, "content": book_dto },
                        "responses": {
                            "201": { "description": "Created", "content": book_dto },
                            "422": error
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [book_id],
                        "responses": {
                            "200": { "description": "Book", "content": book_dto },
                            "404": error
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "parameters": [book_id],
                        "requestBody": { "required": true, "content": book_dto },
                        "responses": {
                            "200": { "description": "Updated", "content": book_dto },
                            "404": error,
                            "422": error
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [book_id],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": error
                        }
                    }
                },
                "/{id}/lend/{user_id}": {
                    "post": {
                        "summary": "Lend a book to a user",
                        "tags": ["Lending"],
                        "parameters": [
                            book_id,
                            {
                                "name": "user_id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "string", "format": "uuid" }
                            }
                        ],
                        "responses": {
                            "200": { "description": "Lent book", "content": book },
                            "404": error,
                            "409": error
                        }
                    }
                },
                "/{id}/return": {
                    "post": {
                        "summary": "Return a lent book",
                        "tags": ["Lending"],
                        "parameters": [book_id],
                        "responses": {
                            "200": { "description": "Returned book", "content": book },
                            "409": error
                        }
                    }
                },
                "/{id}/reprice": {
                    "post": {
                        "summary": "Depreciate the cost by edition year",
                        "tags": ["Lending"],
                        "parameters": [book_id],
                        "responses": {
                            "200": { "description": "Repriced book", "content": book },
                            "422": error
                        }
                    }
                },
                "/reports/borrowed": {
                    "get": {
                        "summary": "Number of borrowed books",
                        "tags": ["Reports"],
                        "responses": { "200": { "description": "Count" }, "422": error }
                    }
                },
                "/reports/costs": {
                    "get": {
                        "summary": "Total and highest book cost",
                        "tags": ["Reports"],
                        "responses": { "200": { "description": "Cost summary" }, "422": error }
                    }
                },
                "/reports/overdue-users": {
                    "get": {
                        "summary": "Users with a late devolution date",
                        "tags": ["Reports"],
                        "responses": { "200": { "description": "Users" }, "422": error }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookDto": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "name": { "type": "string" },
                            "author": { "type": "string" },
                            "description": { "type": "string" },
                            "cost": { "type": "string", "description": "Decimal amount" },
                            "year_edition": { "type": "string", "format": "date" }
                        },
                        "required": ["name", "author"]
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "name": { "type": "string" },
                            "author": { "type": "string" },
                            "description": { "type": "string" },
                            "cost": { "type": "string", "nullable": true },
                            "year_edition": { "type": "string", "format": "date", "nullable": true },
                            "is_borrowed": { "type": "boolean", "nullable": true },
                            "devolution_date": { "type": "string", "format": "date", "nullable": true },
                            "user": { "$ref": "#/components/schemas/User" }
                        },
                        "required": ["id", "name", "author"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(service: Arc<BookService>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(service))
}
