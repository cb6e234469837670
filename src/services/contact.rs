//! Contact form intake.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{
    ContactRequest, ContactSubmission, PageQuery, SubmissionFilter, SubmissionPage,
};
use crate::store::ContactStore;
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct ContactService {
    contacts: Arc<dyn ContactStore>,
}

impl ContactService {
    pub fn new(contacts: Arc<dyn ContactStore>) -> Self {
        Self { contacts }
    }

    pub async fn submit(&self, request: &ContactRequest) -> Result<ContactSubmission> {
        let submission = ContactSubmission::submit(request)?;
        self.contacts.insert_contact(&submission).await?;
        tracing::info!(submission_id = %submission.id, "contact message received");
        Ok(submission)
    }

    pub async fn get(&self, id: Uuid) -> Result<ContactSubmission> {
        self.contacts
            .find_contact(id)
            .await?
            .ok_or(CommerceError::ContactSubmissionNotFound)
    }

    /// Newest first. The filter's status is ignored.
    pub async fn list(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<SubmissionPage<ContactSubmission>> {
        let query = PageQuery::from(filter);
        let (rows, total) = self.contacts.list_contacts(query).await?;
        Ok(SubmissionPage::new(rows, total, query))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.contacts.delete_contact(id).await? {
            return Err(CommerceError::ContactSubmissionNotFound);
        }
        tracing::info!(submission_id = %id, "contact message deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn request(email: &str) -> ContactRequest {
        ContactRequest {
            name: Some("Tahmid".into()),
            email: Some(email.into()),
            message: Some("Do you ship to Sylhet?".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_and_page() {
        let service = ContactService::new(Arc::new(MemoryStore::new()));
        for _ in 0..3 {
            service.submit(&request("t@example.com")).await.unwrap();
        }
        let filter = SubmissionFilter {
            page: Some("2".into()),
            limit: Some("2".into()),
            ..Default::default()
        };
        let page = service.list(&filter).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.submissions.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_email_is_not_stored() {
        let service = ContactService::new(Arc::new(MemoryStore::new()));
        let err = service.submit(&request("nobody")).await.unwrap_err();
        assert!(matches!(err, CommerceError::InvalidEmail));
        let page = service.list(&SubmissionFilter::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_contact() {
        let service = ContactService::new(Arc::new(MemoryStore::new()));
        let err = service.delete(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, CommerceError::ContactSubmissionNotFound));
    }
}
