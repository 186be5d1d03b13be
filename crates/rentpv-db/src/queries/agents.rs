//! Agent database queries.

use chrono::Utc;
use rusqlite::Connection;
use rentpv_common::{AgentId, Error, Result};

use crate::models::Agent;

const AGENT_COLUMNS: &str = "id, email, full_name, phone, company, created_at";

/// Create a new agent.
///
/// # Returns
///
/// * `Ok(Agent)` - The created agent
/// * `Err(Error::InvalidInput)` - If the email is already registered
/// * `Err(Error)` - On any other database error
pub fn create_agent(
    conn: &Connection,
    email: &str,
    full_name: &str,
    phone: Option<&str>,
    company: Option<&str>,
) -> Result<Agent> {
    let agent = Agent {
        id: AgentId::new(),
        email: email.trim().to_string(),
        full_name: full_name.trim().to_string(),
        phone: phone.map(String::from),
        company: company.map(String::from),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO agents (id, email, full_name, phone, company, created_at)
         VALUES (:id, :email, :full_name, :phone, :company, :created_at)",
        rusqlite::named_params! {
            ":id": agent.id.to_string(),
            ":email": &agent.email,
            ":full_name": &agent.full_name,
            ":phone": &agent.phone,
            ":company": &agent.company,
            ":created_at": agent.created_at.to_rfc3339(),
        },
    )
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            Error::invalid_input(format!("Email '{}' is already registered", agent.email))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(agent)
}

/// Get an agent by ID.
pub fn get_agent(conn: &Connection, id: AgentId) -> Result<Option<Agent>> {
    let sql = format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1");
    match conn.query_row(&sql, [id.to_string()], Agent::from_row) {
        Ok(agent) => Ok(Some(agent)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}
