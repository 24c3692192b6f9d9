use crate::database::contacts::ContactFilter;
use crate::database::{agents, contacts, upload_history, AsyncDbConnection};
use crate::jobs::distribution::distribute;
use extractors::{parse_list, validate_rows, ListFormat, RawRow};
use shared_types::{
    Agent, AgentDistribution, AgentStatus, BulkUpdateContactsRequest, Contact, ContactStatus,
    CreateAgentRequest, DistributionResponse, DistributionSummary, ListError, RosterError,
    RowRejection, UpdateAgentRequest, UpdateContactRequest, UploadStatus,
};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// What a successful ingestion reports back to the caller
#[derive(Debug)]
pub struct UploadOutcome {
    pub upload_id: i64,
    pub accepted: u64,
    pub rejections: Vec<RowRejection>,
    pub distribution: DistributionSummary,
}

fn list_persistence(e: anyhow::Error) -> ListError {
    ListError::PersistenceFailure(format!("{:#}", e))
}

fn roster_persistence(e: anyhow::Error) -> RosterError {
    RosterError::PersistenceFailure(format!("{:#}", e))
}

fn require_field(value: &str, field: &str) -> Result<(), RosterError> {
    if value.trim().is_empty() {
        return Err(RosterError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(())
}

fn require_email(email: &str) -> Result<(), RosterError> {
    require_field(email, "email")?;
    if !email.contains('@') {
        return Err(RosterError::InvalidRequest(format!(
            "'{}' is not a valid email",
            email.trim()
        )));
    }
    Ok(())
}

/// Owns every write to contact assignments.
///
/// Replacing the contact list, redistributing, and any roster or assignment
/// change all run while holding `write_lock`, so two of them never
/// interleave. Parsing and validation happen before the lock is taken.
pub struct ListManager {
    db_conn: AsyncDbConnection,
    write_lock: Arc<Mutex<()>>,
}

impl ListManager {
    pub fn new(db_conn: AsyncDbConnection) -> Self {
        Self {
            db_conn,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Parses, validates and stores an uploaded list, replacing every existing
    /// contact, then redistributes. Every call leaves one audit record that
    /// ends as either success or failed.
    pub async fn ingest(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        uploaded_by: Option<&str>,
    ) -> Result<UploadOutcome, ListError> {
        let started = Instant::now();
        let upload_id = upload_history::create(
            self.db_conn.clone(),
            file_name,
            bytes.len() as i64,
            uploaded_by,
        )
        .await
        .map_err(list_persistence)?;

        tracing::info!(
            "Processing upload {} ({}, {} bytes)",
            upload_id,
            file_name,
            bytes.len()
        );

        let result = self.process_upload(file_name, bytes).await;
        let elapsed_ms = started.elapsed().as_millis() as i64;

        match result {
            Ok((accepted, rejections, distribution)) => {
                upload_history::finalize(
                    self.db_conn.clone(),
                    upload_id,
                    UploadStatus::Success,
                    accepted as i64,
                    None,
                    elapsed_ms,
                )
                .await
                .map_err(list_persistence)?;

                tracing::info!(
                    "Upload {} stored {} contacts ({} rejected) across {} agents in {}ms",
                    upload_id,
                    accepted,
                    rejections.len(),
                    distribution.agent_count,
                    elapsed_ms
                );

                Ok(UploadOutcome {
                    upload_id,
                    accepted,
                    rejections,
                    distribution,
                })
            }
            Err(e) => {
                tracing::error!("Upload {} failed: {}", upload_id, e);

                if let Err(finalize_err) = upload_history::finalize(
                    self.db_conn.clone(),
                    upload_id,
                    UploadStatus::Failed,
                    0,
                    Some(&e.to_string()),
                    elapsed_ms,
                )
                .await
                {
                    tracing::warn!(
                        "Failed to record failure of upload {}: {}",
                        upload_id,
                        finalize_err
                    );
                }

                Err(e)
            }
        }
    }

    async fn process_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(u64, Vec<RowRejection>, DistributionSummary), ListError> {
        let format = ListFormat::from_file_name(file_name)?;

        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<RawRow>, ListError> {
            parse_list(Cursor::new(bytes), format)?.collect()
        })
        .await
        .map_err(|e| ListError::MalformedInput(format!("parser task failed: {}", e)))??;

        if rows.is_empty() {
            return Err(ListError::ValidationEmpty {
                message: "No valid records found in file".to_string(),
                rejections: Vec::new(),
            });
        }

        let report = validate_rows(rows);
        if report.accepted.is_empty() {
            return Err(ListError::ValidationEmpty {
                message: "No valid contacts found in file".to_string(),
                rejections: report.rejections,
            });
        }

        let _guard = self.write_lock.lock().await;

        let stored = contacts::replace_all(self.db_conn.clone(), &report.accepted)
            .await
            .map_err(list_persistence)?;
        let distribution = self
            .redistribute_locked()
            .await
            .map_err(list_persistence)?;

        Ok((stored as u64, report.rejections, distribution))
    }

    /// Clears every assignment and repartitions all contacts across the
    /// active roster. Safe to re-run after a partial failure.
    pub async fn redistribute(&self) -> Result<DistributionSummary, RosterError> {
        let _guard = self.write_lock.lock().await;
        self.redistribute_locked()
            .await
            .map_err(roster_persistence)
    }

    /// Caller must hold `write_lock`
    async fn redistribute_locked(&self) -> anyhow::Result<DistributionSummary> {
        let active = agents::list_active(self.db_conn.clone()).await?;
        let all = contacts::list_all(self.db_conn.clone()).await?;

        contacts::clear_assignments(self.db_conn.clone()).await?;

        let plan = distribute(&all, &active);
        for batch in &plan.batches {
            let ids: Vec<i64> = batch.contacts.iter().map(|c| c.id).collect();
            contacts::assign_many(self.db_conn.clone(), &ids, Some(batch.agent.id)).await?;
        }

        self.recount_all().await?;

        let summary = plan.summary();
        if summary.agent_count == 0 && summary.total_contacts > 0 {
            tracing::warn!(
                "No active agents; {} contacts left unassigned",
                summary.unassigned
            );
        } else {
            tracing::info!(
                "Distributed {} contacts across {} agents",
                summary.total_contacts,
                summary.agent_count
            );
        }

        Ok(summary)
    }

    /// Rewrites every agent's cached count from the contact table
    async fn recount_all(&self) -> anyhow::Result<()> {
        for agent_id in agents::list_agent_ids(self.db_conn.clone()).await? {
            self.recount(agent_id).await?;
        }
        Ok(())
    }

    async fn recount(&self, agent_id: i64) -> anyhow::Result<()> {
        let count = contacts::count_by_agent(self.db_conn.clone(), agent_id).await?;
        agents::set_contact_count(self.db_conn.clone(), agent_id, count).await
    }

    async fn find_agent(&self, id: i64) -> Result<Agent, RosterError> {
        agents::get_agent(self.db_conn.clone(), id)
            .await
            .map_err(roster_persistence)?
            .ok_or(RosterError::AgentNotFound(id))
    }

    async fn find_contact(&self, id: i64) -> Result<Contact, RosterError> {
        contacts::get_contact(self.db_conn.clone(), id)
            .await
            .map_err(roster_persistence)?
            .ok_or(RosterError::ContactNotFound(id))
    }

    async fn find_active_agent(&self, id: i64) -> Result<Agent, RosterError> {
        let agent = self.find_agent(id).await?;
        if agent.status != AgentStatus::Active {
            return Err(RosterError::InactiveAgent(id));
        }
        Ok(agent)
    }

    pub async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent, RosterError> {
        require_field(&request.name, "name")?;
        require_email(&request.email)?;
        require_field(&request.mobile, "mobile")?;

        let _guard = self.write_lock.lock().await;

        if agents::email_taken(self.db_conn.clone(), &request.email, None)
            .await
            .map_err(roster_persistence)?
        {
            return Err(RosterError::DuplicateEmail(agents::normalize_email(
                &request.email,
            )));
        }

        let agent = agents::insert_agent(
            self.db_conn.clone(),
            &request.name,
            &request.email,
            &request.mobile,
        )
        .await
        .map_err(roster_persistence)?;

        tracing::info!("Created agent {} ({})", agent.id, agent.email);

        self.redistribute_locked()
            .await
            .map_err(roster_persistence)?;

        self.find_agent(agent.id).await
    }

    pub async fn update_agent(
        &self,
        id: i64,
        request: &UpdateAgentRequest,
    ) -> Result<Agent, RosterError> {
        if let Some(name) = &request.name {
            require_field(name, "name")?;
        }
        if let Some(email) = &request.email {
            require_email(email)?;
        }
        if let Some(mobile) = &request.mobile {
            require_field(mobile, "mobile")?;
        }

        let _guard = self.write_lock.lock().await;

        let existing = self.find_agent(id).await?;

        let email = request.email.as_deref().unwrap_or(&existing.email);
        if agents::normalize_email(email) != existing.email
            && agents::email_taken(self.db_conn.clone(), email, Some(id))
                .await
                .map_err(roster_persistence)?
        {
            return Err(RosterError::DuplicateEmail(agents::normalize_email(email)));
        }

        let status = request.status.unwrap_or(existing.status);
        agents::update_agent(
            self.db_conn.clone(),
            id,
            request.name.as_deref().unwrap_or(&existing.name),
            email,
            request.mobile.as_deref().unwrap_or(&existing.mobile),
            status,
        )
        .await
        .map_err(roster_persistence)?;

        if status != existing.status {
            tracing::info!(
                "Agent {} changed from {} to {}, redistributing",
                id,
                existing.status.as_str(),
                status.as_str()
            );
            self.redistribute_locked()
                .await
                .map_err(roster_persistence)?;
        }

        self.find_agent(id).await
    }

    pub async fn delete_agent(&self, id: i64) -> Result<(), RosterError> {
        let _guard = self.write_lock.lock().await;

        if !agents::delete_agent(self.db_conn.clone(), id)
            .await
            .map_err(roster_persistence)?
        {
            return Err(RosterError::AgentNotFound(id));
        }

        tracing::info!("Deleted agent {}, redistributing", id);

        self.redistribute_locked()
            .await
            .map_err(roster_persistence)?;

        Ok(())
    }

    /// Updates a contact's workflow fields and, when `assigned_agent_id` is
    /// given, moves it to that agent and recounts both agents.
    pub async fn update_contact(
        &self,
        id: i64,
        request: &UpdateContactRequest,
    ) -> Result<Contact, RosterError> {
        if let Some(first_name) = &request.first_name {
            require_field(first_name, "first name")?;
        }
        if let Some(phone) = &request.phone {
            require_field(phone, "phone")?;
        }

        let _guard = self.write_lock.lock().await;

        let existing = self.find_contact(id).await?;

        if let Some(agent_id) = request.assigned_agent_id {
            self.find_active_agent(agent_id).await?;
        }

        let status = request.status.unwrap_or(existing.status);
        let last_contacted_at = if request.status == Some(ContactStatus::Contacted) {
            Some(chrono::Utc::now().timestamp())
        } else {
            existing.last_contacted_at
        };

        contacts::update_contact(
            self.db_conn.clone(),
            id,
            request
                .first_name
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.first_name),
            request.phone.as_deref().map(str::trim).unwrap_or(&existing.phone),
            request.notes.as_deref().unwrap_or(&existing.notes),
            status,
            last_contacted_at,
        )
        .await
        .map_err(roster_persistence)?;

        if let Some(agent_id) = request.assigned_agent_id {
            if existing.assigned_agent_id != Some(agent_id) {
                contacts::assign(self.db_conn.clone(), id, Some(agent_id))
                    .await
                    .map_err(roster_persistence)?;

                let mut touched = vec![agent_id];
                touched.extend(existing.assigned_agent_id);
                for agent in touched {
                    self.recount(agent).await.map_err(roster_persistence)?;
                }

                tracing::info!(
                    "Reassigned contact {} from {:?} to agent {}",
                    id,
                    existing.assigned_agent_id,
                    agent_id
                );
            }
        }

        self.find_contact(id).await
    }

    pub async fn delete_contact(&self, id: i64) -> Result<(), RosterError> {
        let _guard = self.write_lock.lock().await;

        let existing = self.find_contact(id).await?;
        contacts::delete_contact(self.db_conn.clone(), id)
            .await
            .map_err(roster_persistence)?;

        if let Some(agent_id) = existing.assigned_agent_id {
            self.recount(agent_id).await.map_err(roster_persistence)?;
        }

        Ok(())
    }

    /// Returns how many contacts were updated
    pub async fn bulk_update_contacts(
        &self,
        request: &BulkUpdateContactsRequest,
    ) -> Result<u64, RosterError> {
        if request.contact_ids.is_empty() {
            return Err(RosterError::InvalidRequest(
                "Contact IDs are required".to_string(),
            ));
        }
        if request.status.is_none() && request.assigned_agent_id.is_none() {
            return Err(RosterError::InvalidRequest(
                "No valid updates provided".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let mut updated = 0;
        if let Some(agent_id) = request.assigned_agent_id {
            self.find_active_agent(agent_id).await?;
            updated = contacts::assign_many(self.db_conn.clone(), &request.contact_ids, Some(agent_id))
                .await
                .map_err(roster_persistence)?;
            self.recount_all().await.map_err(roster_persistence)?;
        }
        if let Some(status) = request.status {
            let changed =
                contacts::set_status_many(self.db_conn.clone(), &request.contact_ids, status)
                    .await
                    .map_err(roster_persistence)?;
            updated = updated.max(changed);
        }

        tracing::info!("Bulk updated {} contacts", updated);

        Ok(updated as u64)
    }

    /// Each active agent with its contacts, plus the unassigned count
    pub async fn distribution(&self) -> Result<DistributionResponse, RosterError> {
        let active = agents::list_active(self.db_conn.clone())
            .await
            .map_err(roster_persistence)?;

        let mut view = Vec::with_capacity(active.len());
        for agent in active {
            let assigned = contacts::list_by_agent(self.db_conn.clone(), agent.id)
                .await
                .map_err(roster_persistence)?;
            view.push(AgentDistribution {
                agent_id: agent.id,
                name: agent.name,
                email: agent.email,
                contacts: assigned,
            });
        }

        let unassigned_count = contacts::count_unassigned(self.db_conn.clone())
            .await
            .map_err(roster_persistence)?;

        Ok(DistributionResponse {
            agents: view,
            unassigned_count: unassigned_count as u64,
        })
    }

    pub async fn list_contacts(
        &self,
        filter: &ContactFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<Contact>, u64), RosterError> {
        if contacts::page_window(page, limit).is_none() {
            return Err(RosterError::InvalidRequest(format!(
                "Page {} is out of range",
                page
            )));
        }

        contacts::list_contacts(self.db_conn.clone(), filter, page, limit)
            .await
            .map_err(roster_persistence)
    }

    pub async fn get_contact(&self, id: i64) -> Result<Contact, RosterError> {
        self.find_contact(id).await
    }

    pub async fn get_agent(&self, id: i64) -> Result<Agent, RosterError> {
        self.find_agent(id).await
    }
}
