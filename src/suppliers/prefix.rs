use crate::config::PrefixRuleSetting;

/// Static `code prefix -> supplier` rules, tested in declared order
#[derive(Debug, Clone, Default)]
pub struct PrefixRules {
    rules: Vec<(String, String)>,
}

impl PrefixRules {
    pub fn new<I, P, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<String>,
        S: Into<String>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|(p, s)| (p.into(), s.into()))
                .collect(),
        }
    }

    pub fn from_settings(settings: &[PrefixRuleSetting]) -> Self {
        Self::new(
            settings
                .iter()
                .map(|r| (r.prefix.clone(), r.supplier.clone())),
        )
    }

    /// First rule whose prefix starts `code`
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(prefix, _)| code.starts_with(prefix.as_str()))
            .map(|(_, supplier)| supplier.as_str())
    }
}
