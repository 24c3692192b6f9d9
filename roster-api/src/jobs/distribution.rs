use shared_types::{Agent, AgentShare, Contact, DistributionSummary};

/// One agent's contiguous share of the contact list
#[derive(Debug)]
pub struct AgentBatch<'a> {
    pub agent: &'a Agent,
    pub contacts: &'a [Contact],
}

#[derive(Debug)]
pub struct Distribution<'a> {
    pub batches: Vec<AgentBatch<'a>>,
    /// Non-empty only when there are no agents to receive contacts
    pub unassigned: &'a [Contact],
}

/// Partitions `contacts` across `agents` in the order given.
///
/// With n contacts and k agents every agent receives `n / k` contacts and the
/// first `n % k` agents receive one more. Contacts are handed out as
/// contiguous slices, so the first agent gets the first contacts in list
/// order. The same inputs always yield the same partition. With no agents
/// every contact is left unassigned.
pub fn distribute<'a>(contacts: &'a [Contact], agents: &'a [Agent]) -> Distribution<'a> {
    if agents.is_empty() {
        return Distribution {
            batches: Vec::new(),
            unassigned: contacts,
        };
    }

    let base = contacts.len() / agents.len();
    let remainder = contacts.len() % agents.len();

    let mut batches = Vec::with_capacity(agents.len());
    let mut start = 0;
    for (index, agent) in agents.iter().enumerate() {
        let size = if index < remainder { base + 1 } else { base };
        batches.push(AgentBatch {
            agent,
            contacts: &contacts[start..start + size],
        });
        start += size;
    }

    Distribution {
        batches,
        unassigned: &contacts[start..],
    }
}

impl Distribution<'_> {
    pub fn summary(&self) -> DistributionSummary {
        let shares: Vec<AgentShare> = self
            .batches
            .iter()
            .map(|batch| AgentShare {
                agent_id: batch.agent.id,
                agent_name: batch.agent.name.clone(),
                contact_count: batch.contacts.len() as u64,
            })
            .collect();
        let assigned: u64 = shares.iter().map(|s| s.contact_count).sum();

        DistributionSummary {
            total_contacts: assigned + self.unassigned.len() as u64,
            agent_count: self.batches.len() as u64,
            unassigned: self.unassigned.len() as u64,
            shares,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{AgentStatus, ContactStatus};
    use std::collections::HashSet;

    fn contacts(n: usize) -> Vec<Contact> {
        (1..=n as i64)
            .map(|id| Contact {
                id,
                first_name: format!("Contact{}", id),
                phone: format!("555-{:04}", id),
                notes: String::new(),
                status: ContactStatus::New,
                assigned_agent_id: None,
                assigned_agent_name: None,
                last_contacted_at: None,
                created_at: 0,
                updated_at: 0,
            })
            .collect()
    }

    fn agents(k: usize) -> Vec<Agent> {
        (1..=k as i64)
            .map(|id| Agent {
                id,
                name: format!("Agent{}", id),
                email: format!("agent{}@example.com", id),
                mobile: String::new(),
                status: AgentStatus::Active,
                contact_count: 0,
                created_at: 0,
                updated_at: 0,
            })
            .collect()
    }

    fn sizes(distribution: &Distribution<'_>) -> Vec<usize> {
        distribution.batches.iter().map(|b| b.contacts.len()).collect()
    }

    #[test]
    fn test_ten_contacts_three_agents() {
        let contacts = contacts(10);
        let agents = agents(3);
        let distribution = distribute(&contacts, &agents);

        assert_eq!(sizes(&distribution), vec![4, 3, 3]);
        let agent_ids: Vec<i64> = distribution.batches.iter().map(|b| b.agent.id).collect();
        assert_eq!(agent_ids, vec![1, 2, 3]);

        let first: Vec<i64> = distribution.batches[0].contacts.iter().map(|c| c.id).collect();
        assert_eq!(first, vec![1, 2, 3, 4]);
        assert_eq!(distribution.batches[2].contacts[0].id, 8);
        assert!(distribution.unassigned.is_empty());
    }

    #[test]
    fn test_partition_properties_hold_for_all_small_inputs() {
        for n in 0..40 {
            for k in 1..9 {
                let contacts = contacts(n);
                let agents = agents(k);
                let distribution = distribute(&contacts, &agents);
                let sizes = sizes(&distribution);

                let max = *sizes.iter().max().unwrap();
                let min = *sizes.iter().min().unwrap();
                assert!(max - min <= 1, "n={} k={} sizes={:?}", n, k, sizes);

                let remainder = n % k;
                for (index, size) in sizes.iter().enumerate() {
                    let expected = n / k + usize::from(index < remainder);
                    assert_eq!(*size, expected, "n={} k={}", n, k);
                }

                let seen: Vec<i64> = distribution
                    .batches
                    .iter()
                    .flat_map(|b| b.contacts.iter().map(|c| c.id))
                    .collect();
                assert_eq!(seen.len(), n);
                assert_eq!(seen.iter().collect::<HashSet<_>>().len(), n);
                assert!(distribution.unassigned.is_empty());
            }
        }
    }

    #[test]
    fn test_no_agents_leaves_everything_unassigned() {
        let contacts = contacts(5);
        let distribution = distribute(&contacts, &[]);

        assert!(distribution.batches.is_empty());
        assert_eq!(distribution.unassigned.len(), 5);

        let summary = distribution.summary();
        assert_eq!(summary.agent_count, 0);
        assert_eq!(summary.unassigned, 5);
        assert_eq!(summary.total_contacts, 5);
    }

    #[test]
    fn test_no_contacts_gives_every_agent_an_empty_batch() {
        let agents = agents(3);
        let distribution = distribute(&[], &agents);

        assert_eq!(sizes(&distribution), vec![0, 0, 0]);
        assert_eq!(distribution.summary().total_contacts, 0);
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let contacts = contacts(17);
        let agents = agents(4);

        let assignments = |d: Distribution<'_>| -> Vec<(i64, Vec<i64>)> {
            d.batches
                .iter()
                .map(|b| (b.agent.id, b.contacts.iter().map(|c| c.id).collect()))
                .collect()
        };

        assert_eq!(
            assignments(distribute(&contacts, &agents)),
            assignments(distribute(&contacts, &agents))
        );
    }

    #[test]
    fn test_summary_shares() {
        let contacts = contacts(7);
        let agents = agents(2);
        let summary = distribute(&contacts, &agents).summary();

        assert_eq!(summary.total_contacts, 7);
        assert_eq!(summary.agent_count, 2);
        assert_eq!(summary.unassigned, 0);
        assert_eq!(summary.shares[0].agent_name, "Agent1");
        assert_eq!(summary.shares[0].contact_count, 4);
        assert_eq!(summary.shares[1].contact_count, 3);
    }
}
