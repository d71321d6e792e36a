//! REST implementation of [`PlatformClient`].

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{OutboundMessage, PlatformClient, PlatformError, RichMenuRequest, WebhookInfo};

/// Client for the platform's bot REST API, authenticated with the channel
/// access token.
pub struct RestClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl RestClient {
    pub fn new(base_url: String, access_token: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.access_token))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, PlatformError> {
        let response = req.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api { status, message });
        }
        Ok(response)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<(), PlatformError> {
        self.send(self.request(Method::POST, path).json(body))
            .await?;
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRichMenuResponse {
    rich_menu_id: String,
}

#[async_trait]
impl PlatformClient for RestClient {
    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), PlatformError> {
        self.post_json("/message/push", &json!({ "to": to, "messages": messages }))
            .await
    }

    async fn reply(
        &self,
        reply_token: &str,
        messages: &[OutboundMessage],
    ) -> Result<(), PlatformError> {
        self.post_json(
            "/message/reply",
            &json!({ "replyToken": reply_token, "messages": messages }),
        )
        .await
    }

    async fn multicast(
        &self,
        to: &[String],
        messages: &[OutboundMessage],
    ) -> Result<(), PlatformError> {
        self.post_json(
            "/message/multicast",
            &json!({ "to": to, "messages": messages }),
        )
        .await
    }

    async fn broadcast(&self, messages: &[OutboundMessage]) -> Result<(), PlatformError> {
        self.post_json("/message/broadcast", &json!({ "messages": messages }))
            .await
    }

    async fn message_content(&self, message_id: &str) -> Result<Vec<u8>, PlatformError> {
        let response = self
            .send(self.request(Method::GET, &format!("/message/{message_id}/content")))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn create_rich_menu(&self, menu: &RichMenuRequest) -> Result<String, PlatformError> {
        let response = self
            .send(self.request(Method::POST, "/richmenu").json(menu))
            .await?;
        let created: CreateRichMenuResponse = response.json().await?;
        Ok(created.rich_menu_id)
    }

    async fn delete_rich_menu(&self, rich_menu_id: &str) -> Result<(), PlatformError> {
        self.send(self.request(Method::DELETE, &format!("/richmenu/{rich_menu_id}")))
            .await?;
        Ok(())
    }

    async fn link_rich_menu_to_user(
        &self,
        user_id: &str,
        rich_menu_id: &str,
    ) -> Result<(), PlatformError> {
        self.send(self.request(
            Method::POST,
            &format!("/user/{user_id}/richmenu/{rich_menu_id}"),
        ))
        .await?;
        Ok(())
    }

    async fn unlink_rich_menu_from_user(&self, user_id: &str) -> Result<(), PlatformError> {
        self.send(self.request(Method::DELETE, &format!("/user/{user_id}/richmenu")))
            .await?;
        Ok(())
    }

    async fn set_default_rich_menu(&self, rich_menu_id: &str) -> Result<(), PlatformError> {
        self.send(self.request(Method::POST, &format!("/user/all/richmenu/{rich_menu_id}")))
            .await?;
        Ok(())
    }

    async fn delete_default_rich_menu(&self) -> Result<(), PlatformError> {
        self.send(self.request(Method::DELETE, "/user/all/richmenu"))
            .await?;
        Ok(())
    }

    async fn webhook_endpoint(&self) -> Result<WebhookInfo, PlatformError> {
        let response = self
            .send(self.request(Method::GET, "/channel/webhook/endpoint"))
            .await?;
        Ok(response.json().await?)
    }

    async fn set_webhook_endpoint(&self, endpoint: &str) -> Result<(), PlatformError> {
        self.send(
            self.request(Method::PUT, "/channel/webhook/endpoint")
                .json(&json!({ "endpoint": endpoint })),
        )
        .await?;
        Ok(())
    }

    async fn test_webhook_endpoint(&self, endpoint: Option<&str>) -> Result<(), PlatformError> {
        let body = match endpoint {
            Some(endpoint) => json!({ "endpoint": endpoint }),
            None => json!({}),
        };
        self.post_json("/channel/webhook/test", &body).await
    }

    async fn leave_group(&self, group_id: &str) -> Result<(), PlatformError> {
        self.send(self.request(Method::POST, &format!("/group/{group_id}/leave")))
            .await?;
        Ok(())
    }

    async fn leave_room(&self, room_id: &str) -> Result<(), PlatformError> {
        self.send(self.request(Method::POST, &format!("/room/{room_id}/leave")))
            .await?;
        Ok(())
    }
}
