use std::collections::BTreeSet;

use culls_contracts::{DEFAULT_ALLOWED_FIELDS, SCRIPTS_FIELD};

const PRESERVE_PREFIX: &str = "--preserve=";

/// Field names the user asked to keep on top of the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreserveList {
    fields: Vec<String>,
}

impl PreserveList {
    /// Splits a `--preserve` value on commas and trims each token.
    ///
    /// Tokens are not validated; an empty value yields a single empty name,
    /// which matches no real field.
    pub fn parse(csv: &str) -> Self {
        Self {
            fields: csv.split(',').map(|k| k.trim().to_string()).collect(),
        }
    }

    /// Scans raw arguments for the first `--preserve=<csv>`; everything else
    /// is ignored.
    pub fn scan_args<I, S>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter()
            .find_map(|arg| arg.as_ref().strip_prefix(PRESERVE_PREFIX).map(Self::parse))
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// `--preserve=scripts` keeps the whole `scripts` object verbatim.
    pub fn keeps_all_scripts(&self) -> bool {
        self.fields.iter().any(|f| f == SCRIPTS_FIELD)
    }

    /// Default allowed fields plus the user's, duplicates collapsed.
    pub fn allowed_fields(&self) -> BTreeSet<&str> {
        let mut out: BTreeSet<&str> = DEFAULT_ALLOWED_FIELDS.iter().copied().collect();
        out.extend(self.fields.iter().map(String::as_str));
        out
    }
}
