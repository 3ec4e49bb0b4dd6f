/// Single-field ascending index on the productions collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub field: &'static str,
    pub unique: bool,
}

impl IndexSpec {
    pub const fn ascending(field: &'static str) -> Self {
        Self {
            field,
            unique: false,
        }
    }

    pub const fn unique(field: &'static str) -> Self {
        Self {
            field,
            unique: true,
        }
    }

    /// Server-side name, following MongoDB's `<field>_<direction>` convention.
    pub fn name(&self) -> String {
        format!("{}_1", self.field)
    }
}

/// Indexes every productions collection carries.
pub const PRODUCTION_INDEXES: &[IndexSpec] = &[
    IndexSpec::unique("orderId"),
    IndexSpec::ascending("status"),
    IndexSpec::ascending("startedAt"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_order_id_is_unique() {
        let unique: Vec<_> = PRODUCTION_INDEXES
            .iter()
            .filter(|index| index.unique)
            .map(|index| index.field)
            .collect();
        assert_eq!(unique, vec!["orderId"]);
    }

    #[test]
    fn names_follow_server_convention() {
        assert_eq!(IndexSpec::ascending("startedAt").name(), "startedAt_1");
    }
}
