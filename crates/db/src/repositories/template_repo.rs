//! Repository for the `workflow_templates` and `template_steps` tables.
//!
//! Templates are validated eagerly at save time: step orders must be unique
//! and positive, approver roles must parse, and every routing target must be
//! the terminal sentinel or an existing step order. All routing violations
//! are collected and returned together so a configuration UI can surface
//! them at once.

use std::collections::BTreeSet;

use signoff_core::roles::OrgRole;
use signoff_core::routing::{validate_template_routing, RoutingError};
use signoff_core::types::DbId;
use sqlx::PgPool;

use crate::models::workflow::{CreateTemplate, TemplateStep, TemplateWithSteps, WorkflowTemplate};

/// Column list for workflow_templates queries.
const TEMPLATE_COLUMNS: &str = "id, organization_id, name, description, \
    allow_sequential_fallback, is_active, created_at, updated_at";

/// Column list for template_steps queries.
const STEP_COLUMNS: &str = "id, template_id, step_order, approver_role, routing, \
    timeout_days, require_all_approvers, created_at, updated_at";

/// Errors from template creation.
#[derive(Debug, thiserror::Error)]
pub enum TemplateStoreError {
    /// One or more routing entries reference nonexistent steps.
    #[error("routing validation failed with {} error(s)", .0.len())]
    Routing(Vec<RoutingError>),

    /// Structural problem with the step set (empty, duplicate order, bad role).
    #[error("invalid template: {0}")]
    Invalid(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub struct TemplateRepo;

impl TemplateRepo {
    /// Create a template and its steps in one transaction.
    ///
    /// Nothing is persisted if any validation fails.
    pub async fn create(
        pool: &PgPool,
        organization_id: DbId,
        input: &CreateTemplate,
    ) -> Result<TemplateWithSteps, TemplateStoreError> {
        if input.steps.is_empty() {
            return Err(TemplateStoreError::Invalid(
                "a template needs at least one step".into(),
            ));
        }

        let mut seen = BTreeSet::new();
        for step in &input.steps {
            if step.step_order <= 0 {
                return Err(TemplateStoreError::Invalid(format!(
                    "step order must be positive, got {}",
                    step.step_order
                )));
            }
            if !seen.insert(step.step_order) {
                return Err(TemplateStoreError::Invalid(format!(
                    "duplicate step order {}",
                    step.step_order
                )));
            }
            if OrgRole::parse(&step.approver_role).is_none() {
                return Err(TemplateStoreError::Invalid(format!(
                    "step {} has unknown approver role '{}'",
                    step.step_order, step.approver_role
                )));
            }
            if step.timeout_days <= 0 {
                return Err(TemplateStoreError::Invalid(format!(
                    "step {} timeout must be positive, got {} days",
                    step.step_order, step.timeout_days
                )));
            }
        }

        let routing_input: Vec<_> = input
            .steps
            .iter()
            .map(|s| (s.step_order, s.routing.clone()))
            .collect();
        let violations = validate_template_routing(&routing_input);
        if !violations.is_empty() {
            return Err(TemplateStoreError::Routing(violations));
        }

        let mut tx = pool.begin().await?;

        let insert_template = format!(
            "INSERT INTO workflow_templates \
                (organization_id, name, description, allow_sequential_fallback) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {TEMPLATE_COLUMNS}"
        );
        let template = sqlx::query_as::<_, WorkflowTemplate>(&insert_template)
            .bind(organization_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.allow_sequential_fallback)
            .fetch_one(&mut *tx)
            .await?;

        let insert_step = format!(
            "INSERT INTO template_steps \
                (template_id, step_order, approver_role, routing, timeout_days, \
                 require_all_approvers) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {STEP_COLUMNS}"
        );
        let mut steps = Vec::with_capacity(input.steps.len());
        for step in &input.steps {
            let role = OrgRole::parse(&step.approver_role)
                .ok_or_else(|| {
                    TemplateStoreError::Invalid(format!(
                        "step {} has unknown approver role '{}'",
                        step.step_order, step.approver_role
                    ))
                })?
                .as_str();
            let routing_json = serde_json::to_value(&step.routing)
                .map_err(|e| TemplateStoreError::Invalid(e.to_string()))?;
            let row = sqlx::query_as::<_, TemplateStep>(&insert_step)
                .bind(template.id)
                .bind(step.step_order)
                .bind(role)
                .bind(routing_json)
                .bind(step.timeout_days)
                .bind(step.require_all_approvers)
                .fetch_one(&mut *tx)
                .await?;
            steps.push(row);
        }

        tx.commit().await?;
        Ok(TemplateWithSteps { template, steps })
    }

    /// Find a template by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<WorkflowTemplate>, sqlx::Error> {
        let query = format!("SELECT {TEMPLATE_COLUMNS} FROM workflow_templates WHERE id = $1");
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a template with its steps ordered by `step_order`.
    pub async fn find_with_steps(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TemplateWithSteps>, sqlx::Error> {
        let Some(template) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let steps = Self::steps_for_template(pool, id).await?;
        Ok(Some(TemplateWithSteps { template, steps }))
    }

    /// List an organization's templates, newest first.
    pub async fn list_for_org(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<WorkflowTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM workflow_templates \
             WHERE organization_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, WorkflowTemplate>(&query)
            .bind(organization_id)
            .fetch_all(pool)
            .await
    }

    /// All steps of a template, ordered.
    pub async fn steps_for_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Vec<TemplateStep>, sqlx::Error> {
        let query = format!(
            "SELECT {STEP_COLUMNS} FROM template_steps \
             WHERE template_id = $1 \
             ORDER BY step_order ASC"
        );
        sqlx::query_as::<_, TemplateStep>(&query)
            .bind(template_id)
            .fetch_all(pool)
            .await
    }

    /// The template's first step (lowest order), if any.
    pub async fn first_step(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Option<TemplateStep>, sqlx::Error> {
        let query = format!(
            "SELECT {STEP_COLUMNS} FROM template_steps \
             WHERE template_id = $1 \
             ORDER BY step_order ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, TemplateStep>(&query)
            .bind(template_id)
            .fetch_optional(pool)
            .await
    }

    /// A specific step of a template by its order.
    pub async fn find_step(
        pool: &PgPool,
        template_id: DbId,
        step_order: i32,
    ) -> Result<Option<TemplateStep>, sqlx::Error> {
        let query = format!(
            "SELECT {STEP_COLUMNS} FROM template_steps \
             WHERE template_id = $1 AND step_order = $2"
        );
        sqlx::query_as::<_, TemplateStep>(&query)
            .bind(template_id)
            .bind(step_order)
            .fetch_optional(pool)
            .await
    }

    /// A step by primary key.
    pub async fn find_step_by_id(
        pool: &PgPool,
        step_id: DbId,
    ) -> Result<Option<TemplateStep>, sqlx::Error> {
        let query = format!("SELECT {STEP_COLUMNS} FROM template_steps WHERE id = $1");
        sqlx::query_as::<_, TemplateStep>(&query)
            .bind(step_id)
            .fetch_optional(pool)
            .await
    }
}
