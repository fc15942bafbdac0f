//! Plain-text renderings for copy and download.
//!
//! Nothing here touches the filesystem; callers decide where text goes.

use crate::models::{HookScript, LongFormScript, ScriptArtifact};

/// `# title`, a blank line, then the displayed content
pub fn full_script(artifact: &ScriptArtifact, content: &str) -> String {
    format!("# {}\n\n{}", artifact.title, content)
}

/// Full script followed by its upload metadata, for downloads
pub fn script_document(artifact: &ScriptArtifact, content: &str) -> String {
    let mut text = full_script(artifact, content);
    if let Some(metadata) = upload_metadata(artifact) {
        text.push_str("\n\n---\n\n");
        text.push_str(&metadata);
    }
    text
}

/// Upload metadata block, if the artifact has any
pub fn upload_metadata(artifact: &ScriptArtifact) -> Option<String> {
    if !artifact.has_metadata() {
        return None;
    }

    let mut out = String::new();
    if let Some(title) = &artifact.youtube_title {
        out.push_str(&format!("## YouTube Title\n{}\n\n", title));
    }
    if let Some(description) = &artifact.youtube_description {
        out.push_str(&format!("## Description\n{}\n\n", description));
    }
    if let Some(tags) = artifact.hashtags.as_ref().filter(|t| !t.is_empty()) {
        out.push_str(&format!("## Hashtags\n{}\n", tags.join(" ")));
    }
    Some(out.trim_end().to_string())
}

pub fn short_form(title: &str, content: &str) -> String {
    format!("# {}\n\n{}", title, content)
}

pub fn hook_script(script: &HookScript) -> String {
    let s = &script.sections;
    let parts = [
        ("[0-5s] Hook", s.hook_0_5.as_str()),
        ("[5-15s] Retention", s.retention_5_15.as_str()),
        ("[15-30s] Roadmap", s.roadmap_15_30.as_str()),
        ("Body", s.body.as_str()),
        ("Mid CTA", s.mid_cta.as_str()),
        ("Ending CTA", s.ending_cta.as_str()),
    ];

    let mut out = format!("# {}\n\n", script.topic);
    for (label, text) in parts {
        out.push_str(&format!("## {}\n{}\n\n", label, text));
    }
    out.trim_end().to_string()
}

/// Every session followed by the appendix and SEO block
pub fn long_form_all(script: &LongFormScript) -> String {
    let mut out = format!("# {}\n\n", script.topic);

    for (label, text) in script.body.sessions.labelled() {
        out.push_str(&format!("## {}\n\n{}\n\n", label, text));
    }

    let appendix = &script.body.appendix;
    out.push_str("---\n\n## Appendix\n\n");
    out.push_str(&format!("### Scene Directions\n{}\n\n", appendix.scene_directions));
    out.push_str(&format!("### BGM / Sound\n{}\n\n", appendix.bgm_recommendations));
    out.push_str(&format!("### Estimated Duration\n{}\n\n", appendix.estimated_duration));

    let seo = &appendix.seo_metadata;
    out.push_str("### SEO\n");
    for title in &seo.titles {
        out.push_str(&format!("- {}\n", title));
    }
    out.push_str(&format!("\n{}\n\nTags: {}", seo.description, seo.tags.join(", ")));
    out
}

/// File-system friendly name for a download of `title`
pub fn file_name(title: &str, extension: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "script" } else { slug };
    format!("{}.{}", slug, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        HookSections, HookTone, LongFormAppendix, LongFormBody, LongFormSessions, ScriptMetadata, SeoMetadata,
    };

    #[test]
    fn test_full_script_layout() {
        let artifact = ScriptArtifact::new("Five habits", "original body");
        assert_eq!(full_script(&artifact, "refined body"), "# Five habits\n\nrefined body");
        assert!(upload_metadata(&artifact).is_none());
    }

    #[test]
    fn test_upload_metadata_block() {
        let artifact = ScriptArtifact::new("T", "c").with_metadata(ScriptMetadata {
            youtube_title: "Upload".to_string(),
            youtube_description: "About".to_string(),
            hashtags: vec!["#a".to_string(), "#b".to_string()],
        });
        let block = upload_metadata(&artifact).unwrap();
        assert!(block.contains("## YouTube Title\nUpload"));
        assert!(block.ends_with("#a #b"));

        let document = script_document(&artifact, "body");
        assert!(document.starts_with("# T\n\nbody\n\n---\n\n## YouTube Title"));
    }

    #[test]
    fn test_hook_script_sections_in_order() {
        let script = HookScript {
            topic: "Topic".to_string(),
            target_audience: "everyone".to_string(),
            tone: HookTone::Friendly,
            sections: HookSections {
                hook_0_5: "h".to_string(),
                retention_5_15: "r".to_string(),
                roadmap_15_30: "m".to_string(),
                body: "b".to_string(),
                mid_cta: "c1".to_string(),
                ending_cta: "c2".to_string(),
            },
        };
        let text = hook_script(&script);
        let hook = text.find("[0-5s]").unwrap();
        let ending = text.find("Ending CTA").unwrap();
        assert!(hook < ending);
        assert!(text.ends_with("c2"));
    }

    #[test]
    fn test_long_form_all_contains_every_session() {
        let script = LongFormScript {
            topic: "Deep topic".to_string(),
            body: LongFormBody {
                sessions: LongFormSessions {
                    session1: "one".to_string(),
                    session2: "two".to_string(),
                    session3: "three".to_string(),
                    session4: "four".to_string(),
                    session5: "five".to_string(),
                },
                appendix: LongFormAppendix {
                    scene_directions: "wide shot".to_string(),
                    bgm_recommendations: "lofi".to_string(),
                    estimated_duration: "18 min".to_string(),
                    seo_metadata: SeoMetadata {
                        titles: vec!["Title A".to_string()],
                        description: "desc".to_string(),
                        tags: vec!["x".to_string(), "y".to_string()],
                    },
                },
            },
        };
        let text = long_form_all(&script);
        for needle in ["one", "two", "three", "four", "five", "wide shot", "- Title A", "Tags: x, y"] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn test_file_name_slug() {
        assert_eq!(file_name("Five Habits: Part 2!", "md"), "five-habits-part-2.md");
        assert_eq!(file_name("!!!", "txt"), "script.txt");
        assert_eq!(file_name("습관 다섯 가지", "md"), "습관-다섯-가지.md");
    }
}
