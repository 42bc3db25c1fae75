use crate::screens::PickerSlot;

pub const HELP_TEXT: &str = "\
mediators [filter]        open the mediation screen, filter the mediator list
cats [filter]             filter the list of cats to mediate
next|prev mediators|cats  page through a list
pick-mediator <id>        choose the mediator
pick <id> <id>            choose the pair
romantic                  toggle effects on romantic like
mediate | sabotage        attempt with the current selection
again                     mediate again
settings                  open the settings screen
toggle <key>              flip a game setting
site-theme <value>        auto, theme-light, theme-dark, theme-clangen-dark, theme-custom
shading | zip             flip a site preference
custom-css <text>         replace the custom CSS
theme <property> <value>  edit a custom theme colour
css                       print the generated custom theme CSS
save                      save settings and go home
moon                      advance the moon (demo runtime only)
home | help | quit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mediators(String),
    Cats(String),
    NextPage(PickerSlot),
    PrevPage(PickerSlot),
    PickMediator(String),
    Pick(String, String),
    Romantic,
    Mediate,
    Sabotage,
    Again,
    Settings,
    Toggle(String),
    SiteTheme(String),
    Shading,
    ExportAsZip,
    CustomCss(String),
    Theme(String, String),
    Css,
    Save,
    Moon,
    Home,
    Help,
    Quit,
}

fn slot(word: Option<&str>) -> Result<PickerSlot, String> {
    match word {
        Some("mediators") | Some("mediator") => Ok(PickerSlot::Mediator),
        Some("cats") => Ok(PickerSlot::Subjects),
        _ => Err("expected `mediators` or `cats`".to_string()),
    }
}

impl Command {
    /// Parse a command line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let mut args = rest.split_whitespace();

        let command = match word {
            "" => return Ok(None),
            "mediators" => Self::Mediators(rest.to_string()),
            "cats" => Self::Cats(rest.to_string()),
            "next" => Self::NextPage(slot(args.next())?),
            "prev" => Self::PrevPage(slot(args.next())?),
            "pick-mediator" => match args.next() {
                Some(id) => Self::PickMediator(id.to_string()),
                None => return Err("usage: pick-mediator <id>".into()),
            },
            "pick" => match (args.next(), args.next()) {
                (Some(a), Some(b)) => Self::Pick(a.to_string(), b.to_string()),
                _ => return Err("usage: pick <id> <id>".into()),
            },
            "romantic" => Self::Romantic,
            "mediate" => Self::Mediate,
            "sabotage" => Self::Sabotage,
            "again" => Self::Again,
            "settings" => Self::Settings,
            // Setting keys may contain spaces ("first cousin mates").
            "toggle" if !rest.is_empty() => Self::Toggle(rest.to_string()),
            "toggle" => return Err("usage: toggle <key>".into()),
            "site-theme" if !rest.is_empty() => Self::SiteTheme(rest.to_string()),
            "site-theme" => return Err("usage: site-theme <value>".into()),
            "shading" => Self::Shading,
            "zip" => Self::ExportAsZip,
            "custom-css" => Self::CustomCss(rest.to_string()),
            "theme" => match rest.split_once(char::is_whitespace) {
                Some((name, value)) => Self::Theme(name.to_string(), value.trim().to_string()),
                None => return Err("usage: theme <property> <value>".into()),
            },
            "css" => Self::Css,
            "save" => Self::Save,
            "moon" => Self::Moon,
            "home" => Self::Home,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command `{other}` (try `help`)")),
        };
        Ok(Some(command))
    }
}
