//! Typed access to the two endpoint shapes of the admin API
//!
//! Configuration singletons (`/serverSettings`) only support GET and PUT.
//! Collections (`/oauth/clients`) are created with POST and addressed by ID.

use super::client::Client;
use super::error::ApiError;
use pfplug::Context;
use serde_json::Value;

pub struct SingletonApi<'a> {
    client: &'a Client,
    path: &'static str,
}

impl<'a> SingletonApi<'a> {
    pub fn new(client: &'a Client, path: &'static str) -> Self {
        Self { client, path }
    }

    pub async fn get(&self, ctx: &Context) -> Result<Value, ApiError> {
        self.client.get(ctx, self.path).await
    }

    pub async fn update(&self, ctx: &Context, body: &Value) -> Result<Value, ApiError> {
        self.client.put(ctx, self.path, body).await
    }
}

pub struct CollectionApi<'a> {
    client: &'a Client,
    path: &'static str,
}

impl<'a> CollectionApi<'a> {
    pub fn new(client: &'a Client, path: &'static str) -> Self {
        Self { client, path }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, urlencoding::encode(id))
    }

    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Value, ApiError> {
        self.client.get(ctx, &self.item_path(id)).await
    }

    pub async fn create(&self, ctx: &Context, body: &Value) -> Result<Value, ApiError> {
        self.client.post(ctx, self.path, body).await
    }

    pub async fn update(&self, ctx: &Context, id: &str, body: &Value) -> Result<Value, ApiError> {
        self.client.put(ctx, &self.item_path(id), body).await
    }

    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<(), ApiError> {
        self.client.delete(ctx, &self.item_path(id)).await
    }
}
