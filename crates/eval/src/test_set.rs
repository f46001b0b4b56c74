use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    pub question: String,
    pub ground_truth: String,
}

impl EvalCase {
    fn new(question: &str, ground_truth: &str) -> Self {
        Self {
            question: question.to_string(),
            ground_truth: ground_truth.to_string(),
        }
    }
}

/// Ten clinical questions. The first five cover the seed graph; the rest
/// need the full PubMedQA ingestion.
pub fn medical_test_set() -> Vec<EvalCase> {
    vec![
        EvalCase::new(
            "What treatments are associated with Hirschsprung Disease?",
            "Transanal Endorectal Pull-Through and Transabdominal Pull-Through.",
        ),
        EvalCase::new(
            "What condition is Transanal Endorectal Pull-Through used for?",
            "Hirschsprung Disease.",
        ),
        EvalCase::new(
            "Does Aquagenic Urticaria affect infants?",
            "Yes, it can manifest as a pediatric form.",
        ),
        EvalCase::new(
            "What are the treatments for hypertension?",
            "Lifestyle changes, beta-blockers (propranolol), diuretics.",
        ),
        EvalCase::new(
            "What is the connection between Landolt C and Strabismus?",
            "Landolt C is associated with Strabismus Amblyopia measurement.",
        ),
        EvalCase::new(
            "What drugs are used to treat Graft-Versus-Host Disease (GVHD)?",
            "Cyclosporine and Chloroquine.",
        ),
        EvalCase::new(
            "Is there a link between obesity and insulin resistance?",
            "Yes, obesity is often associated with insulin resistance and diabetes.",
        ),
        EvalCase::new(
            "What are the potential side effects of statins?",
            "Muscle pain, increased risk of diabetes, liver damage.",
        ),
        EvalCase::new(
            "Does asthma cause systemic inflammation?",
            "Yes, asthma is associated with systemic inflammation and increased CRP levels.",
        ),
        EvalCase::new(
            "What is the relationship between Helicobacter pylori and gastric cancer?",
            "H. pylori infection is a major cause/risk factor for gastric cancer.",
        ),
    ]
}

/// Load cases from a JSON array of `{question, ground_truth}` objects
pub fn load_test_set(path: &std::path::Path) -> anyhow::Result<Vec<EvalCase>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_set() {
        let cases = medical_test_set();
        assert_eq!(cases.len(), 10);
        assert!(cases.iter().all(|c| !c.question.is_empty() && !c.ground_truth.is_empty()));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"question": "Q?", "ground_truth": "A."}}]"#).unwrap();

        let cases = load_test_set(file.path()).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].ground_truth, "A.");
    }
}
