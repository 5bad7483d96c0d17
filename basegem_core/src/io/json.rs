//! Module providing JSON IO for basegem Models
//!
//! The format is the one written by cobrapy's `save_json_model`, so reference models exported
//! from cobrapy can be read directly, and reduced models can be loaded back into cobrapy.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::io::gpr_parse::{parse_gpr, GprParseError};
use crate::metabolic_model::gene::{Gene, GeneActivity};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    genes: Vec<JsonGene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartments: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charge: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
/// Notes and annotations are kept as JSON strings on the model side, anything that does not
/// parse back is written out as a plain string
fn string_to_value(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            activity: GeneActivity::Active, // All genes start as active
            notes: g.notes.map(|v| v.to_string()),
            annotation: g.annotation.map(|v| v.to_string()),
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            notes: m.notes.map(|v| v.to_string()),
            annotation: m.annotation.map(|v| v.to_string()),
        }
    }
}

impl From<&Gene> for JsonGene {
    fn from(g: &Gene) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            notes: g.notes.as_deref().map(string_to_value),
            annotation: g.annotation.as_deref().map(string_to_value),
        }
    }
}

impl From<&Metabolite> for JsonMetabolite {
    fn from(m: &Metabolite) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            compartment: m.compartment.clone(),
            charge: Some(m.charge),
            formula: m.formula.clone(),
            notes: m.notes.as_deref().map(string_to_value),
            annotation: m.annotation.as_deref().map(string_to_value),
        }
    }
}

impl Model {
    /// Read a model from a cobrapy formatted JSON file, the path must end with `.json`
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        if path.as_ref().extension().and_then(|ext| ext.to_str()) != Some("json") {
            return Err(JsonError::NotJsonPath(path.as_ref().display().to_string()));
        }
        let model_str = match fs::read_to_string(path.as_ref()) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        let model = Model::from_json_str(&model_str)?;
        debug!(
            "Read model {:?} from {} ({} reactions, {} metabolites, {} genes)",
            model.id,
            path.as_ref().display(),
            model.reactions.len(),
            model.metabolites.len(),
            model.genes.len()
        );
        Ok(model)
    }

    /// Parse a model from a cobrapy formatted JSON string
    pub fn from_json_str(model_str: &str) -> Result<Model, JsonError> {
        let json_model = match serde_json::from_str::<JsonModel>(model_str) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{:?}", err))),
        };
        Model::from_json(json_model)
    }

    /// Write the model to a cobrapy formatted JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let model_string = self.to_json_string()?;
        fs::write(path, model_string)?;
        Ok(())
    }

    /// Serialize the model to a cobrapy formatted JSON string
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        let json_model = self.to_json();
        Ok(serde_json::to_string(&json_model)?)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty();
        // Start by converting the genes and metabolites using the From methods
        json_model.genes.into_iter().for_each(|g| {
            model.genes.insert(g.id.clone(), Gene::from(g));
        });
        json_model.metabolites.into_iter().for_each(|m| {
            model.metabolites.insert(m.id.clone(), Metabolite::from(m));
        });
        /* Now, iterate through the reactions, parsing GPRs, and adding to
        the objective along the way
        */
        for rxn in json_model.reactions {
            if let Some(missing) = rxn
                .metabolites
                .keys()
                .find(|m| !model.metabolites.contains_key(*m))
            {
                return Err(JsonError::UnknownMetabolite(missing.clone(), rxn.id));
            }
            let gpr = if !rxn.gene_reaction_rule.trim().is_empty() {
                Some(parse_gpr(&rxn.gene_reaction_rule, &mut model.genes)?)
            } else {
                None
            };
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .gpr(gpr)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .notes(rxn.notes.map(|v| v.to_string()))
                .annotation(rxn.annotation.map(|v| v.to_string()))
                .build()?;
            // Add the reaction to the objective function if desired
            if let Some(coef) = rxn.objective_coefficient {
                if coef != 0. {
                    model.objective.insert(rxn.id.clone(), coef);
                }
            }
            model.reactions.insert(rxn.id, new_reaction);
        }
        model.id = json_model.id;
        model.compartments = json_model.compartments;
        model.version = json_model.version;
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        let json_genes: Vec<JsonGene> = self.genes.values().map(JsonGene::from).collect();
        let json_metabolites: Vec<JsonMetabolite> =
            self.metabolites.values().map(JsonMetabolite::from).collect();
        let json_reactions: Vec<JsonReaction> = self
            .reactions
            .values()
            .map(|r| JsonReaction {
                id: r.id.clone(),
                name: r.name.clone(),
                metabolites: r.metabolites.clone(),
                lower_bound: r.lower_bound,
                upper_bound: r.upper_bound,
                gene_reaction_rule: r
                    .gpr
                    .as_ref()
                    .map(|rule| rule.to_string_id())
                    .unwrap_or_default(),
                objective_coefficient: self.objective.get(&r.id).copied(),
                subsystem: r.subsystem.clone(),
                notes: r.notes.as_deref().map(string_to_value),
                annotation: r.annotation.as_deref().map(string_to_value),
            })
            .collect();

        JsonModel {
            metabolites: json_metabolites,
            reactions: json_reactions,
            genes: json_genes,
            id: self.id.clone(),
            compartments: self.compartments.clone(),
            version: self.version.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to parse a GPR rule during conversion from JSON")]
    GprParserError(#[from] GprParseError),
    #[error("{0} is not a path to a model in JSON format")]
    NotJsonPath(String),
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Metabolite {0} of reaction {1} is not defined in the model")]
    UnknownMetabolite(String, String),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}

// endregion Conversions


#[cfg(test)]
mod model_tests {
    use super::*;
    use crate::metabolic_model::model::{Gpr, GprOperation};
    use std::path::PathBuf;

    fn toy_model_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("toy_model.json")
    }

    #[test]
    fn gene_conversion() {
        let data = r#"
        {
"id":"AT1G01010",
"name":"NAC001",
"notes":{
"original_ids":[
"AT1G01010.1"
]
}
}
        "#;
        let json_gene: JsonGene = serde_json::from_str(data).unwrap();
        let model_gene = Gene::from(json_gene);
        assert_eq!(model_gene.id, "AT1G01010");
        assert_eq!(model_gene.name.unwrap(), "NAC001");
        assert_eq!(model_gene.activity, GeneActivity::Active);
        assert_eq!(
            model_gene.notes.unwrap(),
            r#"{"original_ids":["AT1G01010.1"]}"#
        );
    }

    #[test]
    fn read_json() {
        let model: Model = Model::read_json(toy_model_path()).unwrap();
        assert_eq!(model.reactions.len(), 11);
        assert_eq!(model.metabolites.len(), 7);
        assert_eq!(model.genes.len(), 10);

        let reaction = model.reactions.get("R2").unwrap();
        assert_eq!(reaction.name.clone().unwrap(), "B synthase");
        assert!((reaction.metabolites["a_c"] + 1.0).abs() < 1e-25);
        assert!((reaction.metabolites["b_c"] - 1.0).abs() < 1e-25);
        assert_eq!(reaction.subsystem.clone().unwrap(), "Central");
        match reaction.gpr {
            Some(Gpr::Operation(GprOperation::Or { ref left, ref right })) => {
                assert_eq!(**left, Gpr::new_gene_node("g2"));
                assert_eq!(**right, Gpr::new_gene_node("g3"));
            }
            _ => panic!("Incorrect Parse"),
        }
        assert!(model.reactions["EX_a"].gpr.is_none());

        // Tests for the objective
        assert_eq!(model.objective.len(), 1);
        assert!((model.objective["BIOMASS"] - 1.0).abs() < 1e-25);

        // Tests for id, version and compartments
        assert_eq!(model.id.clone().unwrap(), "toy_model");
        assert_eq!(model.version.clone().unwrap(), "1");
        let mut expected_compartments: IndexMap<String, String> = IndexMap::new();
        expected_compartments.insert("c".to_string(), "cytosol".to_string());
        expected_compartments.insert("e".to_string(), "extracellular space".to_string());
        assert_eq!(model.compartments.clone().unwrap(), expected_compartments);
    }

    #[test]
    fn read_missing_file() {
        let res = Model::read_json(toy_model_path().with_file_name("missing.json"));
        assert!(matches!(res, Err(JsonError::UnableToRead(_))));
    }

    #[test]
    fn read_non_json_path() {
        let res = Model::read_json(toy_model_path().with_file_name("toy_model.xml"));
        assert!(matches!(res, Err(JsonError::NotJsonPath(p)) if p.ends_with("toy_model.xml")));
        let res = Model::read_json(toy_model_path().with_extension(""));
        assert!(matches!(res, Err(JsonError::NotJsonPath(_))));
    }

    #[test]
    fn unknown_metabolite() {
        let data = r#"{
"metabolites":[],
"genes":[],
"reactions":[{"id":"EX_a","metabolites":{"a_e":-1.0},"lower_bound":-10.0,"upper_bound":1000.0}]
}"#;
        match Model::from_json_str(data) {
            Err(JsonError::UnknownMetabolite(met, rxn)) => {
                assert_eq!(met, "a_e");
                assert_eq!(rxn, "EX_a");
            }
            _ => panic!("Unknown metabolite not caught"),
        }
    }

    #[test]
    fn to_json() {
        let model: Model = Model::read_json(toy_model_path()).unwrap();
        let json_model = model.to_json();

        let met = json_model.metabolites.first().unwrap();
        assert_eq!(met.id, "a_e");
        assert_eq!(met.charge.unwrap(), 0);

        let reaction = json_model.reactions.iter().find(|r| r.id == "R8").unwrap();
        assert_eq!(reaction.gene_reaction_rule, "(g8 and g9)");
        assert!((reaction.metabolites["e_c"] - 1.0).abs() < 1e-25);
        let biomass = json_model
            .reactions
            .iter()
            .find(|r| r.id == "BIOMASS")
            .unwrap();
        assert!((biomass.objective_coefficient.unwrap() - 1.0).abs() < 1e-25);

        let gene = json_model.genes.first().unwrap();
        assert_eq!(gene.id, "g1");
        assert_eq!(gene.name.clone().unwrap(), "gene1");
        assert_eq!(json_model.id.unwrap(), "toy_model");
    }

    #[test]
    fn write_and_read_back() {
        let model: Model = Model::read_json(toy_model_path()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("toy_model_copy.json");
        model.write_json(&out_path).unwrap();
        let reread = Model::read_json(&out_path).unwrap();
        assert_eq!(
            reread.reactions.keys().collect::<Vec<_>>(),
            model.reactions.keys().collect::<Vec<_>>()
        );
        assert_eq!(
            reread.genes.keys().collect::<Vec<_>>(),
            model.genes.keys().collect::<Vec<_>>()
        );
        assert_eq!(reread.reactions["R2"].gpr, model.reactions["R2"].gpr);
        assert_eq!(reread.compartments, model.compartments);
    }
}
