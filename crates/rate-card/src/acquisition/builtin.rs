use crate::pricing::{RateTable, RoleRecord};

/// Backup rate card served when no configured source can be loaded.
pub fn rate_table() -> RateTable {
    RateTable::new(vec![
        RoleRecord::new("Salesforce Solution Architect", 100.0, 34.0, 47.0)
            .with_client_rate(190.0),
        RoleRecord::new("Marketing Cloud Specialist", 66.0, 9.0, 32.0).with_client_rate(190.0),
        RoleRecord::new("Commerce Cloud Administrator", 69.0, 12.5, 34.0)
            .with_client_rate(160.0),
        RoleRecord::new("Junior Developer", 69.0, 11.0, 25.0).with_client_rate(140.0),
        RoleRecord::new("Release Manager", 99.0, 13.5, 56.0).with_client_rate(160.0),
        RoleRecord::new("Data/Integration Architect", 129.0, 30.0, 70.0).with_client_rate(190.0),
        RoleRecord::new("QA -Quality Assurance", 0.0, 6.75, 0.0).with_client_rate(18.0),
    ])
}
