use std::fmt;

/// Field delimiter the oracle uses inside a packed question string.
pub const SEPARATOR: char = '\u{241f}';

/// Market question plus the tagging fields the oracle expects.
///
/// Packed form: `text␟"out1","out2"␟category␟locale`.
/// A question with only text packs to the bare text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub outcomes: Vec<String>,
    pub category: Option<String>,
    pub locale: Option<String>,
}

impl Question {
    /// Question with no outcomes, category or locale.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    fn is_plain(&self) -> bool {
        self.outcomes.is_empty() && self.category.is_none() && self.locale.is_none()
    }

    /// Pack into the single string passed to `createMarket`.
    pub fn encode(&self) -> String {
        if self.is_plain() {
            return self.text.clone();
        }

        // JSON string quoting gives the escaping the oracle expects
        let outcomes = self
            .outcomes
            .iter()
            .map(|o| serde_json::Value::String(o.clone()).to_string())
            .collect::<Vec<_>>()
            .join(",");

        let fields = [
            self.text.as_str(),
            outcomes.as_str(),
            self.category.as_deref().unwrap_or(""),
            self.locale.as_deref().unwrap_or(""),
        ];

        fields.join(SEPARATOR.to_string().as_str())
    }

    /// Unpack a question string. Fields missing from the end are left empty.
    /// An outcome list that is not valid quoted JSON strings is dropped.
    pub fn decode(raw: &str) -> Self {
        let mut parts = raw.splitn(4, SEPARATOR);

        let text = parts.next().unwrap_or("").to_string();

        let outcomes = match parts.next() {
            Some(list) if !list.is_empty() => {
                serde_json::from_str::<Vec<String>>(&format!("[{}]", list)).unwrap_or_default()
            }
            _ => Vec::new(),
        };

        let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_string);
        let category = non_empty(parts.next());
        let locale = non_empty(parts.next());

        Self {
            text,
            outcomes,
            category,
            locale,
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
