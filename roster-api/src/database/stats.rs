use crate::database::{agents, contacts, upload_history, AsyncDbConnection};
use anyhow::Result;
use shared_types::{AgentShare, AgentTotals, ContactStatus, ContactTotals, DashboardStats};
use std::collections::HashMap;

const RECENT_UPLOADS: u32 = 5;

/// Live per-agent counts for every active agent, in id order
pub async fn active_agent_shares(conn: AsyncDbConnection) -> Result<Vec<AgentShare>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, COUNT(c.id)
         FROM agents a
         LEFT JOIN contacts c ON c.assigned_agent_id = a.id
         WHERE a.status = 'active'
         GROUP BY a.id, a.name
         ORDER BY a.id",
    )?;
    let shares = stmt
        .query_map([], |row| {
            let count: i64 = row.get(2)?;
            Ok(AgentShare {
                agent_id: row.get(0)?,
                agent_name: row.get(1)?,
                contact_count: count as u64,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(shares)
}

pub async fn dashboard_stats(conn: AsyncDbConnection) -> Result<DashboardStats> {
    let (total, active, inactive) = agents::count_by_status(conn.clone()).await?;

    let mut by_status: HashMap<String, u64> = ContactStatus::ALL
        .iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();
    for (status, count) in contacts::count_by_status(conn.clone()).await? {
        *by_status.entry(status.as_str().to_string()).or_default() += count;
    }
    let contact_total = by_status.values().sum();

    Ok(DashboardStats {
        agents: AgentTotals {
            total,
            active,
            inactive,
        },
        contacts: ContactTotals {
            total: contact_total,
            by_status,
        },
        distribution: active_agent_shares(conn.clone()).await?,
        recent_uploads: upload_history::list_uploads(conn, RECENT_UPLOADS).await?,
    })
}
