//! Affiliate applications: public intake, admin review.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{
    AffiliateRequest, AffiliateStatus, AffiliateStatusRequest, AffiliateSubmission, PageQuery,
    SubmissionFilter, SubmissionPage,
};
use crate::domain::value_objects::non_blank;
use crate::store::AffiliateStore;
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct AffiliateService {
    affiliates: Arc<dyn AffiliateStore>,
}

impl AffiliateService {
    pub fn new(affiliates: Arc<dyn AffiliateStore>) -> Self {
        Self { affiliates }
    }

    pub async fn submit(&self, request: &AffiliateRequest) -> Result<AffiliateSubmission> {
        let submission = AffiliateSubmission::submit(request)?;
        self.affiliates.insert_affiliate(&submission).await?;
        tracing::info!(submission_id = %submission.id, "affiliate application received");
        Ok(submission)
    }

    pub async fn get(&self, id: Uuid) -> Result<AffiliateSubmission> {
        self.affiliates
            .find_affiliate(id)
            .await?
            .ok_or(CommerceError::AffiliateSubmissionNotFound)
    }

    /// Newest first. An unknown status is rejected; bad paging falls back to defaults.
    pub async fn list(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<SubmissionPage<AffiliateSubmission>> {
        let status = non_blank(filter.status.as_deref())
            .map(str::parse::<AffiliateStatus>)
            .transpose()?;
        let query = PageQuery::from(filter);
        let (rows, total) = self.affiliates.list_affiliates(status, query).await?;
        Ok(SubmissionPage::new(rows, total, query))
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        request: &AffiliateStatusRequest,
    ) -> Result<AffiliateSubmission> {
        let mut submission = self.get(id).await?;
        submission.review(request)?;
        if !self.affiliates.update_affiliate(&submission).await? {
            return Err(CommerceError::AffiliateSubmissionNotFound);
        }
        tracing::info!(submission_id = %id, status = %submission.status, "affiliate reviewed");
        Ok(submission)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.affiliates.delete_affiliate(id).await? {
            return Err(CommerceError::AffiliateSubmissionNotFound);
        }
        tracing::info!(submission_id = %id, "affiliate application deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn request(name: &str) -> AffiliateRequest {
        AffiliateRequest {
            name: Some(name.into()),
            about: Some("Fragrance reviews".into()),
            youtube: Some("rafi-scents".into()),
            ..Default::default()
        }
    }

    fn status_filter(status: &str) -> SubmissionFilter {
        SubmissionFilter {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_review_and_filter_by_status() {
        let service = AffiliateService::new(Arc::new(MemoryStore::new()));
        let first = service.submit(&request("Rafi")).await.unwrap();
        service.submit(&request("Mitu")).await.unwrap();

        let review = AffiliateStatusRequest {
            status: "APPROVED".into(),
            notes: None,
        };
        service.update_status(first.id, &review).await.unwrap();

        let approved = service.list(&status_filter("approved")).await.unwrap();
        assert_eq!(approved.total, 1);
        assert_eq!(approved.submissions[0].id, first.id);
        let all = service.list(&SubmissionFilter::default()).await.unwrap();
        assert_eq!((all.total, all.total_pages), (2, 1));

        let err = service.list(&status_filter("MAYBE")).await.unwrap_err();
        assert!(matches!(err, CommerceError::InvalidAffiliateStatus(_)));
    }

    #[tokio::test]
    async fn test_delete_hides_submission() {
        let service = AffiliateService::new(Arc::new(MemoryStore::new()));
        let submission = service.submit(&request("Rafi")).await.unwrap();
        service.delete(submission.id).await.unwrap();
        let err = service.get(submission.id).await.unwrap_err();
        assert!(matches!(err, CommerceError::AffiliateSubmissionNotFound));
        let err = service.delete(submission.id).await.unwrap_err();
        assert!(matches!(err, CommerceError::AffiliateSubmissionNotFound));
    }
}
