//! Subject registry and keyword classifier.
//!
//! Matching is plain substring search over the ASCII-lowercased question. Subjects are tried in
//! registry order and keywords in list order; the first hit wins, so a question mentioning both
//! "tree" and "network" lands in Data Structures.

use crate::error::RegistryError;

/// One allowed subject and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    name: String,
    keywords: Vec<String>,
}

impl Subject {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    fn matches(&self, lowered: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(String::as_str)
    }
}

const DEFAULT_SUBJECTS: &[(&str, &[&str])] = &[
    ("Java", &["java", "jvm", "spring", "servlet"]),
    ("C++", &["c++", "cpp", "c plus"]),
    (
        "Data Structures",
        &["data structure", "array", "linked list", "tree", "graph", "stack", "queue", "heap"],
    ),
    (
        "Operating Systems",
        &["operating system", "os", "process", "thread", "memory management", "scheduling"],
    ),
    ("DBMS", &["dbms", "database", "sql", "query", "normalization", "transaction"]),
    ("Networks", &["network", "tcp", "ip", "http", "osi", "protocol"]),
];

/// Ordered, immutable set of subjects. Build once at startup and share by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRegistry {
    subjects: Vec<Subject>,
}

impl Default for SubjectRegistry {
    fn default() -> Self {
        Self {
            subjects: DEFAULT_SUBJECTS
                .iter()
                .map(|(name, keywords)| Subject {
                    name: (*name).to_string(),
                    keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl SubjectRegistry {
    /// Builds a registry from `(name, keywords)` pairs, keeping their order.
    /// Keywords are lowercased; names must be unique and every subject needs a keyword.
    pub fn new<N, K, I>(entries: I) -> Result<Self, RegistryError>
    where
        N: Into<String>,
        K: AsRef<str>,
        I: IntoIterator<Item = (N, Vec<K>)>,
    {
        let mut subjects: Vec<Subject> = Vec::new();
        for (name, keywords) in entries {
            let name: String = name.into();
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(RegistryError::BlankSubject);
            }
            if subjects.iter().any(|s| s.name == name) {
                return Err(RegistryError::DuplicateSubject(name));
            }
            if keywords.is_empty() {
                return Err(RegistryError::EmptyKeywords(name));
            }
            let mut lowered = Vec::with_capacity(keywords.len());
            for k in &keywords {
                let k = k.as_ref().to_ascii_lowercase();
                if k.trim().is_empty() {
                    return Err(RegistryError::BlankKeyword(name));
                }
                lowered.push(k);
            }
            subjects.push(Subject {
                name,
                keywords: lowered,
            });
        }
        Ok(Self { subjects })
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject_names(&self) -> Vec<&str> {
        self.subjects.iter().map(Subject::name).collect()
    }

    /// First subject (registry order) with a keyword contained in `message`, if any.
    pub fn classify(&self, message: &str) -> Option<&Subject> {
        if message.trim().is_empty() {
            return None;
        }
        let lowered = message.to_ascii_lowercase();
        for subject in &self.subjects {
            if let Some(keyword) = subject.matches(&lowered) {
                tracing::debug!(
                    target: "aitutor::subjects",
                    subject = %subject.name,
                    keyword = %keyword,
                    "keyword matched"
                );
                return Some(subject);
            }
        }
        None
    }

    /// Reply for questions outside every subject. Lists the configured names in order.
    pub fn rejection_message(&self) -> String {
        format!(
            "❌ Sorry, I can only answer questions about: {}. Please ask about one of these topics.",
            join_names(&self.subject_names())
        )
    }
}

/// "A", "A and B", "A, B, and C".
fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [a, b] => format!("{} and {}", a, b),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(r: &SubjectRegistry, msg: &str) -> Option<String> {
        r.classify(msg).map(|s| s.name().to_string())
    }

    #[test]
    fn default_order_is_stable() {
        let r = SubjectRegistry::default();
        assert_eq!(
            r.subject_names(),
            vec!["Java", "C++", "Data Structures", "Operating Systems", "DBMS", "Networks"]
        );
    }

    #[test]
    fn every_keyword_selects_its_subject_when_unshadowed() {
        let r = SubjectRegistry::default();
        for (i, subject) in r.subjects().iter().enumerate() {
            for keyword in subject.keywords() {
                let msg = format!("tell me about {} please", keyword);
                let shadowed = r.subjects()[..i]
                    .iter()
                    .any(|earlier| earlier.matches(&msg).is_some());
                if shadowed {
                    continue;
                }
                assert_eq!(name(&r, &msg).as_deref(), Some(subject.name()), "keyword {:?}", keyword);
            }
        }
    }

    #[test]
    fn blank_input_is_unmatched() {
        let r = SubjectRegistry::default();
        assert_eq!(name(&r, ""), None);
        assert_eq!(name(&r, "   "), None);
        assert_eq!(name(&r, "\n\t"), None);
    }

    #[test]
    fn case_insensitive() {
        let r = SubjectRegistry::default();
        assert_eq!(name(&r, "JAVA basics"), name(&r, "java basics"));
        assert_eq!(name(&r, "JAVA basics").as_deref(), Some("Java"));
    }

    #[test]
    fn first_registry_order_wins_on_double_match() {
        let r = SubjectRegistry::default();
        assert_eq!(
            name(&r, "how does a tree topology affect a network").as_deref(),
            Some("Data Structures")
        );
        assert_eq!(name(&r, "what is a binary search tree?").as_deref(), Some("Data Structures"));
    }

    #[test]
    fn short_keywords_match_inside_words() {
        let r = SubjectRegistry::default();
        // "os" inside "choose", checked before Networks.
        assert_eq!(name(&r, "choose a tcp port").as_deref(), Some("Operating Systems"));
    }

    #[test]
    fn unrelated_question_is_unmatched() {
        let r = SubjectRegistry::default();
        assert_eq!(name(&r, "What's the weather today?"), None);
    }

    #[test]
    fn custom_registry_lowercases_and_keeps_order() {
        let r = SubjectRegistry::new(vec![
            ("Rust", vec!["Borrow", "CARGO"]),
            ("Go", vec!["goroutine"]),
        ])
        .unwrap();
        assert_eq!(r.subjects()[0].keywords(), &["borrow".to_string(), "cargo".to_string()]);
        assert_eq!(name(&r, "cargo workspaces").as_deref(), Some("Rust"));
        assert_eq!(name(&r, "Goroutine leak").as_deref(), Some("Go"));
    }

    #[test]
    fn registry_invariants_are_enforced() {
        assert_eq!(
            SubjectRegistry::new(vec![("A", vec!["x"]), ("A", vec!["y"])]),
            Err(RegistryError::DuplicateSubject("A".into()))
        );
        assert_eq!(
            SubjectRegistry::new(vec![("A", Vec::<&str>::new())]),
            Err(RegistryError::EmptyKeywords("A".into()))
        );
        assert_eq!(
            SubjectRegistry::new(vec![("  ", vec!["x"])]),
            Err(RegistryError::BlankSubject)
        );
        assert_eq!(
            SubjectRegistry::new(vec![("A", vec![" "])]),
            Err(RegistryError::BlankKeyword("A".into()))
        );
    }

    #[test]
    fn rejection_lists_all_subjects() {
        let r = SubjectRegistry::default();
        assert_eq!(
            r.rejection_message(),
            "❌ Sorry, I can only answer questions about: Java, C++, Data Structures, \
             Operating Systems, DBMS, and Networks. Please ask about one of these topics."
        );
    }

    #[test]
    fn join_names_shapes() {
        assert_eq!(join_names(&["A"]), "A");
        assert_eq!(join_names(&["A", "B"]), "A and B");
        assert_eq!(join_names(&["A", "B", "C"]), "A, B, and C");
    }
}
