use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use shared_types::{Contact, ContactStatus, NewContact};

const CONTACT_SELECT: &str =
    "SELECT c.id, c.first_name, c.phone, c.notes, c.status, c.assigned_agent_id, a.name,
            c.last_contacted_at, c.created_at, c.updated_at
     FROM contacts c
     LEFT JOIN agents a ON a.id = c.assigned_agent_id";

fn row_to_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    let status_str: String = row.get(4)?;
    Ok(Contact {
        id: row.get(0)?,
        first_name: row.get(1)?,
        phone: row.get(2)?,
        notes: row.get(3)?,
        status: ContactStatus::parse(&status_str).unwrap_or_default(),
        assigned_agent_id: row.get(5)?,
        assigned_agent_name: row.get(6)?,
        last_contacted_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Discards every stored contact (and with them all assignments) and inserts
/// `contacts` in order, inside one transaction.
pub async fn replace_all(conn: AsyncDbConnection, contacts: &[NewContact]) -> Result<usize> {
    let mut conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM contacts", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO contacts (first_name, phone, notes, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'new', ?4, ?4)",
        )?;
        for contact in contacts {
            stmt.execute(params![contact.first_name, contact.phone, contact.notes, now])?;
        }
    }
    tx.commit()?;

    Ok(contacts.len())
}

/// All contacts in insertion order, which is the order of the uploaded file
pub async fn list_all(conn: AsyncDbConnection) -> Result<Vec<Contact>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!("{} ORDER BY c.id", CONTACT_SELECT))?;
    let contacts = stmt
        .query_map([], row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(contacts)
}

pub async fn list_by_agent(conn: AsyncDbConnection, agent_id: i64) -> Result<Vec<Contact>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare(&format!(
        "{} WHERE c.assigned_agent_id = ? ORDER BY c.id",
        CONTACT_SELECT
    ))?;
    let contacts = stmt
        .query_map([agent_id], row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(contacts)
}

pub async fn clear_assignments(conn: AsyncDbConnection) -> Result<usize> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let changed = conn.execute(
        "UPDATE contacts SET assigned_agent_id = NULL, updated_at = ?
         WHERE assigned_agent_id IS NOT NULL",
        [now],
    )?;

    Ok(changed)
}

/// Returns false when the contact does not exist
pub async fn assign(
    conn: AsyncDbConnection,
    contact_id: i64,
    agent_id: Option<i64>,
) -> Result<bool> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let changed = conn.execute(
        "UPDATE contacts SET assigned_agent_id = ?, updated_at = ? WHERE id = ?",
        params![agent_id, now, contact_id],
    )?;

    Ok(changed > 0)
}

/// Assigns one agent's whole batch in a single transaction
pub async fn assign_many(
    conn: AsyncDbConnection,
    contact_ids: &[i64],
    agent_id: Option<i64>,
) -> Result<usize> {
    let mut conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let tx = conn.transaction()?;
    let mut changed = 0;
    {
        let mut stmt = tx.prepare(
            "UPDATE contacts SET assigned_agent_id = ?, updated_at = ? WHERE id = ?",
        )?;
        for contact_id in contact_ids {
            changed += stmt.execute(params![agent_id, now, contact_id])?;
        }
    }
    tx.commit()?;

    Ok(changed)
}

pub async fn count_by_agent(conn: AsyncDbConnection, agent_id: i64) -> Result<i64> {
    let conn = conn.lock().await?;

    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM contacts WHERE assigned_agent_id = ?",
        [agent_id],
        |row| row.get(0),
    )?;

    Ok(count)
}

pub async fn count_unassigned(conn: AsyncDbConnection) -> Result<i64> {
    let conn = conn.lock().await?;

    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM contacts WHERE assigned_agent_id IS NULL",
        [],
        |row| row.get(0),
    )?;

    Ok(count)
}

pub async fn get_contact(conn: AsyncDbConnection, id: i64) -> Result<Option<Contact>> {
    let conn = conn.lock().await?;

    let contact = conn
        .query_row(
            &format!("{} WHERE c.id = ?", CONTACT_SELECT),
            [id],
            row_to_contact,
        )
        .optional()?;

    Ok(contact)
}

#[derive(Debug, Default, Clone)]
pub struct ContactFilter {
    /// Case-insensitive substring match on first name, phone and notes
    pub search: Option<String>,
    pub agent_id: Option<i64>,
    pub status: Option<ContactStatus>,
}

/// SQL `LIMIT` and `OFFSET` for a 1-based page. `None` when the offset does
/// not fit in an SQLite integer.
pub fn page_window(page: u64, limit: u64) -> Option<(i64, i64)> {
    let limit = limit.max(1);
    let offset = page.saturating_sub(1).checked_mul(limit)?;
    Some((i64::try_from(limit).ok()?, i64::try_from(offset).ok()?))
}

/// Escapes `LIKE` wildcards so search text matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// One page of contacts, newest first, plus the total matching the filter
pub async fn list_contacts(
    conn: AsyncDbConnection,
    filter: &ContactFilter,
    page: u64,
    limit: u64,
) -> Result<(Vec<Contact>, u64)> {
    let (limit, offset) = page_window(page, limit)
        .ok_or_else(|| anyhow::anyhow!("Page {} is out of range", page))?;

    let conn = conn.lock().await?;

    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        clauses.push(
            "(c.first_name LIKE ? ESCAPE '\\' OR c.phone LIKE ? ESCAPE '\\' OR c.notes LIKE ? ESCAPE '\\')",
        );
        let pattern = format!("%{}%", escape_like(search.trim()));
        for _ in 0..3 {
            values.push(Value::Text(pattern.clone()));
        }
    }
    if let Some(agent_id) = filter.agent_id {
        clauses.push("c.assigned_agent_id = ?");
        values.push(Value::Integer(agent_id));
    }
    if let Some(status) = filter.status {
        clauses.push("c.status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM contacts c{}", where_clause),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    let mut page_values = values;
    page_values.push(Value::Integer(limit));
    page_values.push(Value::Integer(offset));

    let mut stmt = conn.prepare(&format!(
        "{}{} ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?",
        CONTACT_SELECT, where_clause
    ))?;
    let contacts = stmt
        .query_map(params_from_iter(page_values.iter()), row_to_contact)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((contacts, total as u64))
}

/// Overwrites the workflow fields of a contact. Assignment is untouched.
pub async fn update_contact(
    conn: AsyncDbConnection,
    id: i64,
    first_name: &str,
    phone: &str,
    notes: &str,
    status: ContactStatus,
    last_contacted_at: Option<i64>,
) -> Result<bool> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let changed = conn.execute(
        "UPDATE contacts
         SET first_name = ?, phone = ?, notes = ?, status = ?, last_contacted_at = ?, updated_at = ?
         WHERE id = ?",
        params![first_name, phone, notes, status.as_str(), last_contacted_at, now, id],
    )?;

    Ok(changed > 0)
}

pub async fn set_status_many(
    conn: AsyncDbConnection,
    contact_ids: &[i64],
    status: ContactStatus,
) -> Result<usize> {
    let mut conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();
    let last_contacted = (status == ContactStatus::Contacted).then_some(now);

    let tx = conn.transaction()?;
    let mut changed = 0;
    {
        let mut stmt = tx.prepare(
            "UPDATE contacts
             SET status = ?, last_contacted_at = COALESCE(?, last_contacted_at), updated_at = ?
             WHERE id = ?",
        )?;
        for contact_id in contact_ids {
            changed += stmt.execute(params![status.as_str(), last_contacted, now, contact_id])?;
        }
    }
    tx.commit()?;

    Ok(changed)
}

pub async fn delete_contact(conn: AsyncDbConnection, id: i64) -> Result<bool> {
    let conn = conn.lock().await?;

    let changed = conn.execute("DELETE FROM contacts WHERE id = ?", [id])?;

    Ok(changed > 0)
}

pub async fn count_by_status(conn: AsyncDbConnection) -> Result<Vec<(ContactStatus, u64)>> {
    let conn = conn.lock().await?;

    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM contacts GROUP BY status")?;
    let counts = stmt
        .query_map([], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((ContactStatus::parse(&status).unwrap_or_default(), count as u64))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::agents;
    use crate::database::test_support::temp_database;

    fn new_contact(name: &str, phone: &str) -> NewContact {
        NewContact {
            first_name: name.to_string(),
            phone: phone.to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_replace_all_discards_previous_contacts() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();

        replace_all(conn.clone(), &[new_contact("Old", "1")]).await.unwrap();
        replace_all(conn.clone(), &[new_contact("A", "2"), new_contact("B", "3")])
            .await
            .unwrap();

        let all = list_all(conn).await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.first_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(all.iter().all(|c| c.status == ContactStatus::New));
        assert!(all.iter().all(|c| c.assigned_agent_id.is_none()));
    }

    #[tokio::test]
    async fn test_assignment_round_trip() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();

        let agent = agents::insert_agent(conn.clone(), "Ana", "ana@example.com", "555")
            .await
            .unwrap();
        replace_all(conn.clone(), &[new_contact("A", "1"), new_contact("B", "2")])
            .await
            .unwrap();
        let ids: Vec<i64> = list_all(conn.clone()).await.unwrap().iter().map(|c| c.id).collect();

        assign_many(conn.clone(), &ids, Some(agent.id)).await.unwrap();
        assert_eq!(count_by_agent(conn.clone(), agent.id).await.unwrap(), 2);

        let by_agent = list_by_agent(conn.clone(), agent.id).await.unwrap();
        assert_eq!(by_agent[0].assigned_agent_name.as_deref(), Some("Ana"));

        assert!(assign(conn.clone(), ids[0], None).await.unwrap());
        assert_eq!(count_unassigned(conn.clone()).await.unwrap(), 1);

        assert_eq!(clear_assignments(conn.clone()).await.unwrap(), 1);
        assert_eq!(count_unassigned(conn.clone()).await.unwrap(), 2);
        assert!(!assign(conn, 9999, Some(agent.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_contacts_filters_and_paginates() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();

        let contacts: Vec<NewContact> = (0..25)
            .map(|i| NewContact {
                first_name: format!("Lead{}", i),
                phone: format!("555-{:04}", i),
                notes: if i % 5 == 0 { "vip".to_string() } else { String::new() },
            })
            .collect();
        replace_all(conn.clone(), &contacts).await.unwrap();

        let (page1, total) = list_contacts(conn.clone(), &ContactFilter::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!(total, 25);
        assert_eq!(page1.len(), 20);

        let (page2, _) = list_contacts(conn.clone(), &ContactFilter::default(), 2, 20)
            .await
            .unwrap();
        assert_eq!(page2.len(), 5);

        let vip = ContactFilter {
            search: Some("VIP".to_string()),
            ..Default::default()
        };
        let (found, total) = list_contacts(conn.clone(), &vip, 1, 20).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(found.len(), 5);

        let literal = ContactFilter {
            search: Some("_".to_string()),
            ..Default::default()
        };
        let (_, total) = list_contacts(conn.clone(), &literal, 1, 20).await.unwrap();
        assert_eq!(total, 0);

        let (beyond, total) = list_contacts(conn.clone(), &ContactFilter::default(), 99, 20)
            .await
            .unwrap();
        assert!(beyond.is_empty());
        assert_eq!(total, 25);

        assert!(list_contacts(conn.clone(), &ContactFilter::default(), u64::MAX, 20)
            .await
            .is_err());

        let contacted = ContactFilter {
            status: Some(ContactStatus::Contacted),
            ..Default::default()
        };
        let (found, total) = list_contacts(conn, &contacted, 1, 20).await.unwrap();
        assert_eq!(total, 0);
        assert!(found.is_empty());
    }

    #[test]
    fn test_page_window() {
        assert_eq!(page_window(1, 20), Some((20, 0)));
        assert_eq!(page_window(0, 20), Some((20, 0)));
        assert_eq!(page_window(3, 0), Some((1, 2)));
        assert_eq!(page_window(u64::MAX, 20), None);
        assert_eq!(page_window(2, u64::MAX), None);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();

        let rows = vec![
            NewContact {
                first_name: "Al".to_string(),
                phone: "1".to_string(),
                notes: "50% off".to_string(),
            },
            NewContact {
                first_name: "Bo".to_string(),
                phone: "2".to_string(),
                notes: "500 off".to_string(),
            },
            NewContact {
                first_name: "Cy_Jr".to_string(),
                phone: "3".to_string(),
                notes: String::new(),
            },
        ];
        replace_all(conn.clone(), &rows).await.unwrap();

        let percent = ContactFilter {
            search: Some("50%".to_string()),
            ..Default::default()
        };
        let (found, total) = list_contacts(conn.clone(), &percent, 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].first_name, "Al");

        let underscore = ContactFilter {
            search: Some("y_J".to_string()),
            ..Default::default()
        };
        let (found, _) = list_contacts(conn, &underscore, 1, 20).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Cy_Jr");
    }

    #[tokio::test]
    async fn test_status_updates() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();

        replace_all(conn.clone(), &[new_contact("A", "1"), new_contact("B", "2")])
            .await
            .unwrap();
        let ids: Vec<i64> = list_all(conn.clone()).await.unwrap().iter().map(|c| c.id).collect();

        assert_eq!(
            set_status_many(conn.clone(), &ids, ContactStatus::Contacted)
                .await
                .unwrap(),
            2
        );
        let contact = get_contact(conn.clone(), ids[0]).await.unwrap().unwrap();
        assert_eq!(contact.status, ContactStatus::Contacted);
        assert!(contact.last_contacted_at.is_some());

        let counts = count_by_status(conn.clone()).await.unwrap();
        assert_eq!(counts, vec![(ContactStatus::Contacted, 2)]);

        assert!(delete_contact(conn.clone(), ids[1]).await.unwrap());
        assert!(get_contact(conn, ids[1]).await.unwrap().is_none());
    }
}
