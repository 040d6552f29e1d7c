//! Escaping and validation helpers for SOQL text and record ids.
//!
//! Every user-provided value spliced into a SOQL string literal must go
//! through [`soql::escape_string`]:
//!
//! ```rust
//! use sftools_client::security::soql;
//!
//! let alias = soql::escape_string("o'neil");
//! let filter = format!("Alias = '{}'", alias);
//! assert_eq!(filter, "Alias = 'o\\'neil'");
//! ```

/// SOQL escaping utilities for injection prevention.
pub mod soql {
    /// Escape a string value for use inside a single-quoted SOQL literal.
    ///
    /// Quotes, backslashes and the `\n`, `\r`, `\t` control characters are
    /// backslash-escaped.
    ///
    /// ```rust
    /// use sftools_client::security::soql;
    ///
    /// assert_eq!(soql::escape_string("O'Brien & Co."), "O\\'Brien & Co.");
    /// ```
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Validate that a field name contains only safe characters.
    ///
    /// A field name starts with an ASCII letter and continues with ASCII
    /// letters, digits or underscores (`Custom_Field__c`, `Account__r`).
    ///
    /// ```rust
    /// use sftools_client::security::soql;
    ///
    /// assert!(soql::is_safe_field_name("CaseNumber"));
    /// assert!(soql::is_safe_field_name("CaseId__c"));
    /// assert!(!soql::is_safe_field_name("Bad'; DROP--"));
    /// ```
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            _ => false,
        }
    }

    /// Validate a relationship path such as `Owner.Name`.
    ///
    /// Each dot-separated segment must be a safe field name.
    #[must_use]
    pub fn is_safe_field_path(path: &str) -> bool {
        path.split('.').all(is_safe_field_name)
    }

    /// Validate that a SObject name is safe.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_field_name(name)
    }
}

/// Record id validation.
pub mod ids {
    /// Validate that a Salesforce ID has the correct format.
    ///
    /// Salesforce IDs are either 15 or 18 ASCII alphanumeric characters.
    ///
    /// ```rust
    /// use sftools_client::security::ids;
    ///
    /// assert!(ids::is_valid_salesforce_id("500000000000001"));
    /// assert!(ids::is_valid_salesforce_id("500000000000001AAA"));
    /// assert!(!ids::is_valid_salesforce_id("jdoe"));
    /// ```
    #[must_use]
    pub fn is_valid_salesforce_id(id: &str) -> bool {
        let len = id.len();
        (len == 15 || len == 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}
