//! Contact Service
//!
//! CRUD, statistics and bulk operations over the caller's contacts. Every
//! mutation is audited against the `Contact` entity.

use std::sync::Arc;

use async_trait::async_trait;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use super::AuditService;
use crate::application::dto::request::{ContactListParams, ContactRequest};
use crate::application::dto::response::{
    AuditEventsResponse, ContactResponse, ContactStatsResponse,
};
use crate::domain::{
    entity_types, AuditAction, Contact, ContactFields, ContactListQuery, ContactRepository,
    ContactSort, ContactSource, ContactStats, ContactStatus,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{PaginatedResponse, PaginationQuery};

pub const MAX_SEED_COUNT: i32 = 100;

/// Contact service trait for dependency injection
#[async_trait]
pub trait ContactService: Send + Sync {
    async fn list(
        &self,
        user_id: Uuid,
        params: ContactListParams,
    ) -> Result<PaginatedResponse<ContactResponse>, AppError>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ContactResponse, AppError>;

    async fn create(&self, user_id: Uuid, req: ContactRequest)
        -> Result<ContactResponse, AppError>;

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: ContactRequest,
    ) -> Result<ContactResponse, AppError>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError>;

    async fn stats(&self, user_id: Uuid) -> Result<ContactStatsResponse, AppError>;

    /// Soft delete the listed contacts the caller owns. Returns how many.
    async fn bulk_delete(&self, user_id: Uuid, ids: Vec<Uuid>) -> Result<i64, AppError>;

    async fn delete_all(&self, user_id: Uuid) -> Result<i64, AppError>;

    async fn toggle_favorite(&self, user_id: Uuid, id: Uuid) -> Result<ContactResponse, AppError>;

    /// Generate `count` fake contacts for an empty account.
    async fn seed(&self, user_id: Uuid, count: i32) -> Result<i64, AppError>;

    async fn audit(
        &self,
        user_id: Uuid,
        id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError>;
}

/// ContactService implementation
pub struct ContactServiceImpl<R>
where
    R: ContactRepository,
{
    contact_repo: Arc<R>,
    audit: Arc<dyn AuditService>,
}

impl<R> ContactServiceImpl<R>
where
    R: ContactRepository,
{
    pub fn new(contact_repo: Arc<R>, audit: Arc<dyn AuditService>) -> Self {
        Self {
            contact_repo,
            audit,
        }
    }

    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> Result<Contact, AppError> {
        self.contact_repo
            .find_by_id(user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contact not found.".into()))
    }

    async fn audit_contact(
        &self,
        user_id: Uuid,
        action: AuditAction,
        contact_id: Uuid,
        metadata: serde_json::Value,
    ) {
        self.audit
            .log(
                Some(user_id),
                action,
                Some(entity_types::CONTACT),
                Some(contact_id),
                Some(metadata),
            )
            .await;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Map a validated request onto entity fields.
fn contact_fields(req: ContactRequest) -> Result<ContactFields, AppError> {
    let status = req.status.parse::<ContactStatus>().map_err(AppError::Validation)?;
    let source = req.source.parse::<ContactSource>().map_err(AppError::Validation)?;

    if req.value.is_some_and(|v| v < Decimal::ZERO) {
        return Err(AppError::Validation(
            "Value must be greater than or equal to 0.".into(),
        ));
    }

    Ok(ContactFields {
        name: req.name.trim().to_string(),
        email: non_empty(req.email),
        company: non_empty(req.company),
        phone: non_empty(req.phone),
        status,
        source,
        value: req.value,
        notes: non_empty(req.notes),
    })
}

/// Build `count` random contacts. The first two are favorites.
fn fake_contacts(user_id: Uuid, count: usize) -> Vec<Contact> {
    let mut rng = rand::rng();

    (0..count)
        .map(|i| {
            let status = ContactStatus::ALL[rng.random_range(0..ContactStatus::ALL.len())];
            let source = ContactSource::ALL[rng.random_range(0..ContactSource::ALL.len())];

            let fields = ContactFields {
                name: Name().fake_with_rng(&mut rng),
                email: rng
                    .random_bool(0.9)
                    .then(|| SafeEmail().fake_with_rng(&mut rng)),
                company: rng
                    .random_bool(0.85)
                    .then(|| CompanyName().fake_with_rng(&mut rng)),
                phone: rng
                    .random_bool(0.7)
                    .then(|| PhoneNumber().fake_with_rng(&mut rng)),
                status,
                source,
                value: rng
                    .random_bool(0.8)
                    .then(|| Decimal::new(rng.random_range(500..=50_000), 0)),
                notes: rng
                    .random_bool(0.6)
                    .then(|| Sentence(4..12).fake_with_rng(&mut rng)),
            };

            let mut contact = Contact::new(user_id, fields);
            contact.is_favorite = i < 2;
            contact
        })
        .collect()
}

#[async_trait]
impl<R> ContactService for ContactServiceImpl<R>
where
    R: ContactRepository + 'static,
{
    async fn list(
        &self,
        user_id: Uuid,
        params: ContactListParams,
    ) -> Result<PaginatedResponse<ContactResponse>, AppError> {
        let page = params.pagination();
        let query = ContactListQuery {
            search: non_empty(params.search),
            sort: ContactSort::parse(params.sort_by.as_deref()),
            limit: page.limit(),
            offset: page.offset(),
        };

        let (contacts, total) = self.contact_repo.list(user_id, &query).await?;

        Ok(PaginatedResponse::new(contacts, total, page).map(ContactResponse::from))
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<ContactResponse, AppError> {
        Ok(self.find_owned(user_id, id).await?.into())
    }

    async fn create(
        &self,
        user_id: Uuid,
        req: ContactRequest,
    ) -> Result<ContactResponse, AppError> {
        let contact = Contact::new(user_id, contact_fields(req)?);
        let created = self.contact_repo.create(&contact).await?;

        info!(user_id = %user_id, contact_id = %created.id, "Contact created");
        self.audit_contact(
            user_id,
            AuditAction::ContactCreate,
            created.id,
            serde_json::json!({ "name": created.name }),
        )
        .await;

        Ok(created.into())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        req: ContactRequest,
    ) -> Result<ContactResponse, AppError> {
        let mut contact = self.find_owned(user_id, id).await?;
        let is_favorite = req.is_favorite;
        contact.update(contact_fields(req)?, is_favorite, user_id);

        let updated = self.contact_repo.update(&contact).await?;

        self.audit_contact(
            user_id,
            AuditAction::ContactUpdate,
            updated.id,
            serde_json::json!({ "name": updated.name }),
        )
        .await;

        Ok(updated.into())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut contact = self.find_owned(user_id, id).await?;
        contact.soft_delete(user_id);
        self.contact_repo.update(&contact).await?;

        info!(user_id = %user_id, contact_id = %id, "Contact deleted");
        self.audit_contact(
            user_id,
            AuditAction::ContactDelete,
            id,
            serde_json::json!({ "name": contact.name }),
        )
        .await;

        Ok(())
    }

    async fn stats(&self, user_id: Uuid) -> Result<ContactStatsResponse, AppError> {
        let contacts = self.contact_repo.find_all(user_id).await?;
        Ok(ContactStats::from_contacts(contacts).into())
    }

    async fn bulk_delete(&self, user_id: Uuid, ids: Vec<Uuid>) -> Result<i64, AppError> {
        if ids.is_empty() {
            return Err(AppError::Validation(
                "At least one contact id is required.".into(),
            ));
        }

        let deleted = self.contact_repo.soft_delete_many(user_id, &ids).await?;
        for id in &deleted {
            self.audit_contact(
                user_id,
                AuditAction::ContactDelete,
                *id,
                serde_json::json!({ "bulk": true }),
            )
            .await;
        }

        info!(user_id = %user_id, requested = ids.len(), deleted = deleted.len(), "Contacts bulk deleted");
        Ok(deleted.len() as i64)
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<i64, AppError> {
        let deleted = self.contact_repo.soft_delete_all(user_id).await?;
        for id in &deleted {
            self.audit_contact(
                user_id,
                AuditAction::ContactDelete,
                *id,
                serde_json::json!({ "bulk": true }),
            )
            .await;
        }

        info!(user_id = %user_id, deleted = deleted.len(), "All contacts deleted");
        Ok(deleted.len() as i64)
    }

    async fn toggle_favorite(&self, user_id: Uuid, id: Uuid) -> Result<ContactResponse, AppError> {
        let mut contact = self.find_owned(user_id, id).await?;
        contact.toggle_favorite(user_id);
        let updated = self.contact_repo.update(&contact).await?;

        self.audit_contact(
            user_id,
            AuditAction::ContactFavorite,
            updated.id,
            serde_json::json!({ "is_favorite": updated.is_favorite }),
        )
        .await;

        Ok(updated.into())
    }

    async fn seed(&self, user_id: Uuid, count: i32) -> Result<i64, AppError> {
        if !(1..=MAX_SEED_COUNT).contains(&count) {
            return Err(AppError::Validation(format!(
                "Count must be between 1 and {}.",
                MAX_SEED_COUNT
            )));
        }

        if self.contact_repo.count(user_id).await? > 0 {
            return Err(AppError::Validation(
                "Cannot seed when contacts already exist.".into(),
            ));
        }

        let contacts = fake_contacts(user_id, count as usize);
        self.contact_repo.create_many(&contacts).await?;

        for contact in &contacts {
            self.audit_contact(
                user_id,
                AuditAction::ContactCreate,
                contact.id,
                serde_json::json!({ "name": contact.name, "seeded": true }),
            )
            .await;
        }

        info!(user_id = %user_id, count, "Contacts seeded");
        Ok(contacts.len() as i64)
    }

    async fn audit(
        &self,
        user_id: Uuid,
        id: Uuid,
        page: PaginationQuery,
    ) -> Result<AuditEventsResponse, AppError> {
        self.find_owned(user_id, id).await?;
        self.audit
            .entity_events(entity_types::CONTACT, id, page)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::MockAuditService;
    use crate::domain::{sample_contact, MockContactRepository};
    use mockall::predicate::*;
    use pretty_assertions::assert_eq;

    fn quiet_audit() -> Arc<dyn AuditService> {
        let mut audit = MockAuditService::new();
        audit.expect_log().returning(|_, _, _, _, _| ());
        Arc::new(audit)
    }

    fn request(json: serde_json::Value) -> ContactRequest {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_contact_is_not_found() {
        let mut repo = MockContactRepository::new();
        repo.expect_find_by_id().returning(|_, _| Ok(None));

        let service = ContactServiceImpl::new(Arc::new(repo), quiet_audit());
        let err = service.get(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();

        match err {
            AppError::NotFound(msg) => assert_eq!(msg, "Contact not found."),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_trims_and_audits() {
        let user = Uuid::new_v4();

        let mut repo = MockContactRepository::new();
        repo.expect_create()
            .withf(|c| c.name == "Ada" && c.email.is_none() && c.status == ContactStatus::Prospect)
            .returning(|c| Ok(c.clone()));

        let mut audit = MockAuditService::new();
        audit
            .expect_log()
            .withf(move |u, action, kind, _, meta| {
                *u == Some(user)
                    && *action == AuditAction::ContactCreate
                    && *kind == Some("Contact")
                    && meta.as_ref().map(|m| m["name"] == "Ada").unwrap_or(false)
            })
            .times(1)
            .returning(|_, _, _, _, _| ());

        let service = ContactServiceImpl::new(Arc::new(repo), Arc::new(audit));
        let created = service
            .create(
                user,
                request(serde_json::json!({ "name": "  Ada ", "email": " ", "status": "Prospect" })),
            )
            .await
            .unwrap();

        assert_eq!(created.name, "Ada");
        assert!(!created.is_favorite);
    }

    #[tokio::test]
    async fn test_update_applies_favorite_flag() {
        let user = Uuid::new_v4();
        let existing = sample_contact(user);
        let id = existing.id;

        let mut repo = MockContactRepository::new();
        repo.expect_find_by_id()
            .with(eq(user), eq(id))
            .returning(move |_, _| Ok(Some(existing.clone())));
        repo.expect_update().returning(|c| Ok(c.clone()));

        let service = ContactServiceImpl::new(Arc::new(repo), quiet_audit());
        let updated = service
            .update(
                user,
                id,
                request(serde_json::json!({ "name": "Ada L.", "is_favorite": true, "status": "Customer" })),
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada L.");
        assert!(updated.is_favorite);
        assert_eq!(updated.status, ContactStatus::Customer);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_is_soft() {
        let user = Uuid::new_v4();
        let existing = sample_contact(user);
        let id = existing.id;

        let mut repo = MockContactRepository::new();
        repo.expect_find_by_id()
            .returning(move |_, _| Ok(Some(existing.clone())));
        repo.expect_update()
            .withf(move |c| c.is_deleted && c.deleted_by == Some(user))
            .times(1)
            .returning(|c| Ok(c.clone()));

        let service = ContactServiceImpl::new(Arc::new(repo), quiet_audit());
        service.delete(user, id).await.unwrap();
    }

    #[tokio::test]
    async fn test_bulk_delete_counts_only_owned() {
        let user = Uuid::new_v4();
        let owned = Uuid::new_v4();

        let mut repo = MockContactRepository::new();
        repo.expect_soft_delete_many()
            .returning(move |_, _| Ok(vec![owned]));

        let mut audit = MockAuditService::new();
        audit
            .expect_log()
            .withf(move |_, action, _, target, _| {
                *action == AuditAction::ContactDelete && *target == Some(owned)
            })
            .times(1)
            .returning(|_, _, _, _, _| ());

        let service = ContactServiceImpl::new(Arc::new(repo), Arc::new(audit));
        let deleted = service
            .bulk_delete(user, vec![owned, Uuid::new_v4()])
            .await
            .unwrap();

        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_ids() {
        let service = ContactServiceImpl::new(Arc::new(MockContactRepository::new()), quiet_audit());
        let err = service.bulk_delete(Uuid::new_v4(), vec![]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_toggle_favorite_flips_flag() {
        let user = Uuid::new_v4();
        let existing = sample_contact(user);
        let id = existing.id;

        let mut repo = MockContactRepository::new();
        repo.expect_find_by_id()
            .returning(move |_, _| Ok(Some(existing.clone())));
        repo.expect_update().returning(|c| Ok(c.clone()));

        let service = ContactServiceImpl::new(Arc::new(repo), quiet_audit());
        assert!(service.toggle_favorite(user, id).await.unwrap().is_favorite);
    }

    #[tokio::test]
    async fn test_seed_rejects_existing_contacts() {
        let mut repo = MockContactRepository::new();
        repo.expect_count().returning(|_| Ok(3));
        repo.expect_create_many().never();

        let service = ContactServiceImpl::new(Arc::new(repo), quiet_audit());
        let err = service.seed(Uuid::new_v4(), 10).await.unwrap_err();

        match err {
            AppError::Validation(msg) => assert_eq!(msg, "Cannot seed when contacts already exist."),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_seed_count_out_of_range() {
        let service = ContactServiceImpl::new(Arc::new(MockContactRepository::new()), quiet_audit());
        assert!(service.seed(Uuid::new_v4(), 0).await.is_err());
        assert!(service.seed(Uuid::new_v4(), 101).await.is_err());
    }

    #[tokio::test]
    async fn test_seed_creates_requested_count() {
        let user = Uuid::new_v4();

        let mut repo = MockContactRepository::new();
        repo.expect_count().returning(|_| Ok(0));
        repo.expect_create_many()
            .withf(move |contacts| {
                contacts.len() == 25
                    && contacts.iter().all(|c| c.user_id == user)
                    && contacts.iter().filter(|c| c.is_favorite).count() == 2
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = ContactServiceImpl::new(Arc::new(repo), quiet_audit());
        assert_eq!(service.seed(user, 25).await.unwrap(), 25);
    }

    #[test]
    fn test_fake_contacts_respect_bounds() {
        let contacts = fake_contacts(Uuid::nil(), 100);
        assert_eq!(contacts.len(), 100);
        assert!(contacts[0].is_favorite && contacts[1].is_favorite);
        assert!(contacts.iter().skip(2).all(|c| !c.is_favorite));
        for c in &contacts {
            assert!(!c.name.is_empty());
            if let Some(v) = c.value {
                assert!(v >= Decimal::new(500, 0) && v <= Decimal::new(50_000, 0));
            }
        }
    }

    #[tokio::test]
    async fn test_list_passes_sort_and_search() {
        let mut repo = MockContactRepository::new();
        repo.expect_list()
            .withf(|_, q| {
                q.sort == ContactSort::ValueDesc
                    && q.search.as_deref() == Some("acme")
                    && q.limit == 10
                    && q.offset == 10
            })
            .returning(|_, _| Ok((vec![], 12)));

        let service = ContactServiceImpl::new(Arc::new(repo), quiet_audit());
        let params: ContactListParams = serde_json::from_value(serde_json::json!({
            "page_number": 2, "search": " acme ", "sort_by": "-value"
        }))
        .unwrap();

        let page = service.list(Uuid::new_v4(), params).await.unwrap();
        assert_eq!(page.total_count, 12);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next_page);
    }

    #[tokio::test]
    async fn test_audit_checks_ownership() {
        let mut repo = MockContactRepository::new();
        repo.expect_find_by_id().returning(|_, _| Ok(None));

        let mut audit = MockAuditService::new();
        audit.expect_entity_events().never();

        let service = ContactServiceImpl::new(Arc::new(repo), Arc::new(audit));
        let err = service
            .audit(Uuid::new_v4(), Uuid::new_v4(), PaginationQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
