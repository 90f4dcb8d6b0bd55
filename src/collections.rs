use crate::records::Record;
use serde_json::Value;

pub const PROFESSEURS: &str = "professeurs";
pub const ELEVES: &str = "eleves";
pub const ABSENCES: &str = "absences";
pub const FINANCES: &str = "finances";
pub const EMPLOIS_DU_TEMPS: &str = "emplois_du_temps";
pub const BULLETINS: &str = "bulletins";
pub const NOTES: &str = "notes";

pub const MATRICULE_FIELD: &str = "matricule";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Masculine,
    Feminine,
}

/// Extra fields injected on create, before the client's own fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedField {
    Matricule,
}

impl GeneratedField {
    pub fn key(self) -> &'static str {
        match self {
            GeneratedField::Matricule => MATRICULE_FIELD,
        }
    }
}

/// One persisted collection and the wording used in responses about it.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub gender: Gender,
    pub generated: Option<GeneratedField>,
}

impl CollectionSpec {
    fn new(name: &'static str, label: &'static str, gender: Gender) -> Self {
        Self {
            name,
            label,
            gender,
            generated: None,
        }
    }

    fn with_generated(mut self, field: GeneratedField) -> Self {
        self.generated = Some(field);
        self
    }

    fn agree(&self, masculine: &str, feminine: &str) -> String {
        match self.gender {
            Gender::Masculine => format!("{} {}", self.label, masculine),
            Gender::Feminine => format!("{} {}", self.label, feminine),
        }
    }

    pub fn created_message(&self) -> String {
        self.agree("ajouté avec succès", "ajoutée avec succès")
    }

    pub fn updated_message(&self) -> String {
        self.agree("mis à jour", "mise à jour")
    }

    pub fn deleted_message(&self) -> String {
        self.agree("supprimé", "supprimée")
    }

    pub fn not_found_message(&self) -> String {
        self.agree("non trouvé", "non trouvée")
    }

    /// True when the client already supplied the generated field. `null` counts as not supplied.
    pub fn input_supplies(&self, field: GeneratedField, input: &Record) -> bool {
        !matches!(input.get(field.key()), None | Some(Value::Null))
    }
}

#[derive(Debug, Clone)]
pub struct CollectionRegistry {
    specs: Vec<CollectionSpec>,
}

impl Default for CollectionRegistry {
    fn default() -> Self {
        Self {
            specs: vec![
                CollectionSpec::new(PROFESSEURS, "Professeur", Gender::Masculine),
                CollectionSpec::new(ELEVES, "Élève", Gender::Masculine)
                    .with_generated(GeneratedField::Matricule),
                CollectionSpec::new(ABSENCES, "Absence", Gender::Feminine),
                CollectionSpec::new(FINANCES, "Paiement", Gender::Masculine),
                CollectionSpec::new(EMPLOIS_DU_TEMPS, "Créneau", Gender::Masculine),
                CollectionSpec::new(BULLETINS, "Bulletin", Gender::Masculine),
                CollectionSpec::new(NOTES, "Note", Gender::Feminine),
            ],
        }
    }
}

impl CollectionRegistry {
    pub fn get(&self, name: &str) -> Option<&CollectionSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(|s| s.name).collect()
    }
}
