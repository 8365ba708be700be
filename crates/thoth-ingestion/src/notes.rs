//! Note rendering (spec §4.2 step 7): a templated markdown note
//! combining the analysis record and citation list for one article.

use minijinja::{context, Environment};
use thoth_db::Citation;

use crate::analysis::AnalysisRecord;

const NOTE_TEMPLATE: &str = r#"# {{ title }}

{% if doi %}DOI: {{ doi }}
{% endif -%}
{% if arxiv_id %}arXiv: {{ arxiv_id }}
{% endif -%}
{% if year %}Year: {{ year }}
{% endif %}

## Analysis ({{ analysis.preset }})

{% for key, value in analysis.fields %}- **{{ key }}**: {{ value }}
{% endfor %}

## Citations ({{ citations | length }})

{% for c in citations %}{{ loop.index }}. {{ c.raw }}{% if c.resolved %} _(resolved)_{% endif %}
{% endfor %}
"#;

pub fn render_note(
    title: &str,
    doi: Option<&str>,
    arxiv_id: Option<&str>,
    year: Option<i64>,
    analysis: Option<&AnalysisRecord>,
    citations: &[Citation],
) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("note", NOTE_TEMPLATE)?;
    let tmpl = env.get_template("note")?;

    let citation_views: Vec<CitationView> = citations
        .iter()
        .map(|c| CitationView { raw: c.raw.clone(), resolved: c.target_article_id.is_some() })
        .collect();

    let analysis_view = analysis.map(|a| AnalysisView { preset: a.preset.clone(), fields: a.fields.clone() });

    tmpl.render(context! {
        title,
        doi,
        arxiv_id,
        year,
        analysis => analysis_view,
        citations => citation_views,
    })
}

#[derive(serde::Serialize)]
struct CitationView {
    raw: String,
    resolved: bool,
}

#[derive(serde::Serialize)]
struct AnalysisView {
    preset: String,
    fields: std::collections::BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    #[test]
    fn renders_title_and_citation_count() {
        let citation = Citation::new(Uuid::new_v4(), "Smith et al., 2020".to_string());
        let analysis = AnalysisRecord { preset: "default".to_string(), schema_version: "1".to_string(), fields: BTreeMap::new() };

        let note = render_note("A Paper", Some("10.1/x"), None, Some(2020), Some(&analysis), std::slice::from_ref(&citation)).unwrap();

        assert!(note.contains("# A Paper"));
        assert!(note.contains("DOI: 10.1/x"));
        assert!(note.contains("Citations (1)"));
        assert!(note.contains("Smith et al., 2020"));
    }
}
