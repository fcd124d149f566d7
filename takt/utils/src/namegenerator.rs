use crate::Id;
use std::collections::{HashMap, HashSet};

/// Simple HashMap-based name generator that generates new names for each
/// prefix. Used to assign default entity names to resources the caller did
/// not name explicitly.
#[derive(Clone, Debug, Default)]
pub struct NameGenerator {
    name_hash: HashMap<Id, i64>,
    generated_names: HashSet<Id>,
}

impl NameGenerator {
    /// Create a NameGenerator where `names` are already defined so that this
    /// generator will never generate those names.
    pub fn with_prev_defined_names(names: HashSet<Id>) -> Self {
        NameGenerator {
            generated_names: names,
            name_hash: HashMap::default(),
        }
    }

    /// Add generated names
    pub fn add_names(&mut self, names: HashSet<Id>) {
        self.generated_names.extend(names)
    }

    /// Returns a new name that starts with `prefix`.
    /// For example:
    /// ```ignore
    /// namegen.gen_name("memory");  // Generates "memory0"
    /// namegen.gen_name("memory");  // Generates "memory1"
    /// ```
    pub fn gen_name<S>(&mut self, prefix: S) -> Id
    where
        S: Into<Id>,
    {
        let mut cur_prefix: Id = prefix.into();
        loop {
            let count = self
                .name_hash
                .entry(cur_prefix)
                .and_modify(|v| *v += 1)
                .or_insert(0);

            let name = Id::from(format!("{cur_prefix}{count}"));

            // If we've not generated this name before, return it.
            if !self.generated_names.contains(&name) {
                self.generated_names.insert(name);
                return name;
            }

            // If the name was generated before, use the current name as the
            // prefix.
            cur_prefix = name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NameGenerator;
    use crate::Id;
    use std::collections::HashSet;

    #[test]
    fn unique_names_per_prefix() {
        let mut namegen = NameGenerator::default();
        assert_eq!(namegen.gen_name("memory"), Id::from("memory0"));
        assert_eq!(namegen.gen_name("memory"), Id::from("memory1"));
        assert_eq!(namegen.gen_name("pe"), Id::from("pe0"));
    }

    #[test]
    fn avoids_predefined_names() {
        let taken: HashSet<Id> = [Id::from("memory0")].into_iter().collect();
        let mut namegen = NameGenerator::with_prev_defined_names(taken);
        assert_ne!(namegen.gen_name("memory"), Id::from("memory0"));
    }
}
