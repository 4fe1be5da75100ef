//! Drop and lookup endpoints.
//!
//! Read-only dashboard data plus drop creation/publishing. These carry
//! no client-side logic beyond typing.

use crate::error::ClientError;
use crate::types::{CreateDropRequest, Drop, DropTemplate, DropVideo, Grade, School, Topic};
use crate::G3msClient;

impl G3msClient {
    /// List reusable drop templates. `GET /drops/templates`.
    pub async fn get_drop_templates(&self) -> Result<Vec<DropTemplate>, ClientError> {
        self.get("/drops/templates").await
    }

    /// List lesson videos available for drops. `GET /drops/videos`.
    pub async fn get_drop_videos(&self) -> Result<Vec<DropVideo>, ClientError> {
        self.get("/drops/videos").await
    }

    /// List subject topics. `GET /topics`.
    pub async fn get_topics(&self) -> Result<Vec<Topic>, ClientError> {
        self.get("/topics").await
    }

    /// Search the school directory. `GET /schools`.
    pub async fn get_schools(&self) -> Result<Vec<School>, ClientError> {
        self.get("/schools").await
    }

    /// List grade levels. `GET /grades`.
    pub async fn get_grades(&self) -> Result<Vec<Grade>, ClientError> {
        self.get("/grades").await
    }

    /// List the authenticated educator's drops. `GET /drops/educator`.
    pub async fn get_educator_drops(&self) -> Result<Vec<Drop>, ClientError> {
        self.get("/drops/educator").await
    }

    /// Create a drop from a draft. `POST /drops`.
    pub async fn create_drop(&self, draft: &CreateDropRequest) -> Result<Drop, ClientError> {
        self.post("/drops", draft).await
    }

    /// Publish a drop to students. `POST /drops/{id}/publish`.
    pub async fn publish_drop(&self, drop_id: &str) -> Result<Drop, ClientError> {
        self.post_empty(&format!("/drops/{}/publish", drop_id)).await
    }
}
