//! Service tickets
//!
//! Ticket numbers are issued locally so the caller hears one in the same
//! turn that completes their request; the authoritative write to the
//! rent-manager system happens in a background task and never delays or
//! fails the voice response.

use std::sync::Arc;

use rand::Rng;
use tracing::{error, info};

use crate::{
    dialogue::intents::IssueCategory,
    rentman::{NewServiceIssue, RentManagerClient},
};

/// A filed maintenance ticket
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    /// Caller-facing ticket number, e.g. `SV-48213`
    pub number: String,
    pub category: String,
    pub address: String,
}

impl Ticket {
    /// The confirmation sentence the caller hears, repeated verbatim on
    /// any later turn of the same call.
    pub fn confirmation(&self) -> String {
        format!(
            "Perfect! I've created service ticket #{} for your {} issue at {}. Dimitry will contact you within 2-4 hours.",
            self.number, self.category, self.address
        )
    }
}

/// Issues tickets and ships them to the rent-manager system
pub struct TicketOffice {
    rentman: Option<Arc<RentManagerClient>>,
}

impl TicketOffice {
    pub fn new(rentman: Option<Arc<RentManagerClient>>) -> Self {
        Self { rentman }
    }

    /// Issue a ticket for a completed request.
    ///
    /// The returned ticket carries a locally generated number; the backend
    /// write is spawned off and only logged.
    pub fn issue(
        &self,
        category: IssueCategory,
        description: &str,
        address: &str,
        caller_number: &str,
    ) -> Ticket {
        let number = format!("SV-{}", rand::thread_rng().gen_range(10000..100000));
        let ticket = Ticket {
            number: number.clone(),
            category: category.label().to_string(),
            address: address.to_string(),
        };
        info!(
            "Issued ticket {} ({}) at {} for caller {}",
            ticket.number, ticket.category, ticket.address, caller_number
        );

        if let Some(client) = self.rentman.clone() {
            let issue = NewServiceIssue {
                description: format!("{}: {}", category.label(), description),
                category: category.label().to_string(),
                priority: (if category.is_urgent() { "High" } else { "Normal" }).to_string(),
                unit: address.to_string(),
                caller_number: caller_number.to_string(),
                local_reference: number,
            };
            tokio::spawn(async move {
                match client.create_service_issue(&issue).await {
                    Ok(Some(issue_id)) => {
                        info!("Rent-manager accepted {} as issue {}", issue.local_reference, issue_id)
                    }
                    Ok(None) => {
                        error!("Rent-manager did not acknowledge {}", issue.local_reference)
                    }
                    Err(e) => error!(
                        "Background ticket write failed for {}: {}",
                        issue.local_reference, e
                    ),
                }
            });
        }

        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_tickets_carry_sv_numbers_in_range() {
        let office = TicketOffice::new(None);
        for _ in 0..50 {
            let ticket = office.issue(
                IssueCategory::Heating,
                "no heat",
                "122 Targee Street",
                "+15550001111",
            );
            let digits: u32 = ticket.number.strip_prefix("SV-").unwrap().parse().unwrap();
            assert!((10000..100000).contains(&digits));
        }
    }

    #[tokio::test]
    async fn confirmation_names_number_category_and_address() {
        let office = TicketOffice::new(None);
        let ticket = office.issue(
            IssueCategory::Electrical,
            "outlet sparking",
            "29 Port Richmond Avenue",
            "+15550001111",
        );
        let confirmation = ticket.confirmation();
        assert!(confirmation.contains(&ticket.number));
        assert!(confirmation.contains("electrical"));
        assert!(confirmation.contains("29 Port Richmond Avenue"));
        assert!(confirmation.contains("2-4 hours"));
    }
}
