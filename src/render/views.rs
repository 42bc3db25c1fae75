use crate::bridge::Cat;
use crate::prefs::{SitePreferences, site_theme_label};
use crate::screens::{
    ALLOW_ROMANTIC_LABEL, CUSTOM_CSS_WARNING, CurrentPair, EXPORT_AS_ZIP_LABEL, MEDIATION_INTRO,
    MediationControls, MediationView, NO_MEDIATORS_NOTICE, PAIR_RULE, ReadyView, SHADING_LABEL,
    SettingRow,
};
use crate::theme::{ThemeEditor, format_property_name};

use super::registry::Panel;

pub const PANEL_MEDIATION_STATUS: &str = "mediation.status";
pub const PANEL_MEDIATION_INTRO: &str = "mediation.intro";
pub const PANEL_MEDIATORS: &str = "mediation.mediators";
pub const PANEL_CATS: &str = "mediation.cats";
pub const PANEL_PAIR: &str = "mediation.pair";
pub const PANEL_CONTROLS: &str = "mediation.controls";
pub const PANEL_NARRATIVE: &str = "mediation.narrative";
pub const PANEL_GAME_SETTINGS: &str = "settings.game";
pub const PANEL_SITE: &str = "settings.site";
pub const PANEL_THEME: &str = "settings.theme";

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn cat_line(cat: &Cat, selected: bool) -> String {
    format!(
        "{} {:>4}  {} ({})",
        checkbox(selected),
        cat.id,
        cat.display_name(),
        cat.status
    )
}

fn cat_list(cats: &[Cat], is_selected: impl Fn(&Cat) -> bool, locked: bool) -> String {
    let mut lines: Vec<String> = cats.iter().map(|cat| cat_line(cat, is_selected(cat))).collect();
    if lines.is_empty() {
        lines.push("(no cats)".to_string());
    }
    if locked {
        lines.push("(selection locked)".to_string());
    }
    lines.join("\n")
}

fn pair_line(pair: &CurrentPair) -> String {
    let name = |cat: &Option<Cat>| {
        cat.as_ref()
            .map(|cat| cat.display_name().to_string())
            .unwrap_or_else(|| "?".to_string())
    };
    let mut text = format!("{} {} {}", name(&pair.first), pair.indicator(), name(&pair.second));
    if let Some(status) = pair.status() {
        text.push('\n');
        text.push_str(status);
    }
    text
}

fn controls_text(view: &ReadyView) -> String {
    match view.controls {
        MediationControls::Start { actions_enabled } => {
            let state = if actions_enabled { "" } else { " (disabled)" };
            format!(
                "{} {ALLOW_ROMANTIC_LABEL}\n[mediate]{state} [sabotage]{state}",
                checkbox(view.allow_romantic)
            )
        }
        MediationControls::InProgress => "[again] Mediate Again".to_string(),
    }
}

/// Panels for the mediation screen in display order.
pub fn mediation_panels(view: &MediationView) -> Vec<Panel> {
    let ready = match view {
        MediationView::Loading => {
            return vec![Panel::new(PANEL_MEDIATION_STATUS, "Mediate", "Loading...")];
        }
        MediationView::NoMediators => {
            return vec![Panel::new(PANEL_MEDIATION_STATUS, "Mediate", NO_MEDIATORS_NOTICE)];
        }
        MediationView::Ready(ready) => ready,
    };

    let locked = !ready.selection_enabled;
    let mut panels = vec![
        Panel::new(
            PANEL_MEDIATION_INTRO,
            "Mediate",
            format!("{MEDIATION_INTRO}\n{PAIR_RULE}"),
        ),
        Panel::new(
            PANEL_MEDIATORS,
            "Mediator",
            cat_list(
                &ready.mediator_candidates,
                |cat| ready.selected_mediator.as_deref() == Some(cat.id.as_str()),
                locked,
            ),
        ),
        Panel::new(
            PANEL_CATS,
            "Cats",
            cat_list(
                &ready.subject_candidates,
                |cat| ready.selected_subjects.contains(&cat.id),
                locked,
            ),
        ),
        Panel::new(PANEL_PAIR, "Pair", pair_line(&ready.pair)),
        Panel::new(PANEL_CONTROLS, "Actions", controls_text(ready)),
    ];
    if !ready.narrative.is_empty() {
        panels.push(Panel::new(PANEL_NARRATIVE, "Result", ready.narrative.clone()));
    }
    panels
}

/// Panels for the settings screen: game flags, site preferences and the
/// custom theme editor.
pub fn settings_panels(
    rows: &[SettingRow],
    site: &SitePreferences,
    theme: &ThemeEditor,
) -> Vec<Panel> {
    let game = if rows.is_empty() {
        "(no settings reported)".to_string()
    } else {
        rows.iter()
            .map(|row| format!("{} {}: {}", checkbox(row.checked), row.key, row.label))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let theme_label = site_theme_label(&site.site_theme).unwrap_or("Unknown");
    let css = if site.custom_css.is_empty() {
        "(none)"
    } else {
        site.custom_css.as_str()
    };
    let site_text = [
        format!("Theme: {theme_label} ({})", site.site_theme),
        format!("{} {SHADING_LABEL}", checkbox(site.shading)),
        format!("{} {EXPORT_AS_ZIP_LABEL}", checkbox(site.export_as_zip)),
        "Custom CSS:".to_string(),
        css.to_string(),
        CUSTOM_CSS_WARNING.to_string(),
    ]
    .join("\n");

    vec![
        Panel::new(PANEL_GAME_SETTINGS, "Game Settings", game),
        Panel::new(PANEL_SITE, "Site Settings", site_text),
        theme_panel(theme),
    ]
}

pub fn theme_panel(theme: &ThemeEditor) -> Panel {
    let mut lines: Vec<String> = theme
        .properties()
        .map(|(name, value)| format!("{}: {value}", format_property_name(name)))
        .collect();
    if !theme.extra_css().is_empty() {
        lines.push(format!("Extra CSS: {}", theme.extra_css()));
    }
    Panel::new(PANEL_THEME, "Custom Theme", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(controls: MediationControls, narrative: &str) -> ReadyView {
        ReadyView {
            mediator_candidates: vec![Cat::new("1", "Jayfeather", "mediator")],
            subject_candidates: vec![
                Cat::new("3", "Lionblaze", "warrior"),
                Cat::new("4", "Cinderheart", "warrior"),
            ],
            selected_mediator: Some("1".into()),
            selected_subjects: vec!["3".into(), "4".into()],
            pair: CurrentPair {
                first: Some(Cat::new("3", "Lionblaze", "warrior")),
                second: Some(Cat::new("4", "Cinderheart", "warrior")),
                already_mediated: true,
            },
            allow_romantic: false,
            narrative: narrative.to_string(),
            selection_enabled: matches!(controls, MediationControls::Start { .. }),
            controls,
        }
    }

    fn content<'a>(panels: &'a [Panel], id: &str) -> &'a str {
        panels
            .iter()
            .find(|panel| panel.id == id)
            .map(|panel| panel.content.as_str())
            .unwrap()
    }

    #[test]
    fn no_mediators_shows_only_the_notice() {
        let panels = mediation_panels(&MediationView::NoMediators);
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].content, NO_MEDIATORS_NOTICE);
    }

    #[test]
    fn mediated_pair_is_marked_and_actions_disabled() {
        let view = MediationView::Ready(ready(
            MediationControls::Start {
                actions_enabled: false,
            },
            "",
        ));
        let panels = mediation_panels(&view);
        assert_eq!(
            content(&panels, PANEL_PAIR),
            "Lionblaze X Cinderheart\nPair has already been mediated this moon."
        );
        assert!(content(&panels, PANEL_CONTROLS).contains("[mediate] (disabled)"));
        assert!(panels.iter().all(|panel| panel.id != PANEL_NARRATIVE));
    }

    #[test]
    fn in_progress_locks_pickers_and_shows_result() {
        let view = MediationView::Ready(ready(MediationControls::InProgress, "It went well."));
        let panels = mediation_panels(&view);
        assert!(content(&panels, PANEL_MEDIATORS).ends_with("(selection locked)"));
        assert_eq!(content(&panels, PANEL_CONTROLS), "[again] Mediate Again");
        assert_eq!(content(&panels, PANEL_NARRATIVE), "It went well.");
    }

    #[test]
    fn settings_panels_list_rows_and_site_prefs() {
        let rows = vec![SettingRow {
            key: "affair",
            label: "Allow cats to breed with cats that aren't their mates",
            checked: true,
        }];
        let site = SitePreferences {
            shading: true,
            ..SitePreferences::default()
        };
        let panels = settings_panels(&rows, &site, &ThemeEditor::new());
        assert_eq!(
            content(&panels, PANEL_GAME_SETTINGS),
            "[x] affair: Allow cats to breed with cats that aren't their mates"
        );
        let site_text = content(&panels, PANEL_SITE);
        assert!(site_text.starts_with("Theme: Sync with System (auto)"));
        assert!(site_text.contains("[x] Enable shading"));
        assert!(content(&panels, PANEL_THEME).starts_with("Page Background Color: rgb(56,50,38)"));
    }
}
