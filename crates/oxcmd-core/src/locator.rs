//! Locator resolution.
//!
//! Test scripts address elements with locator strings such as `id=submit`,
//! `css=.nav > a`, `//button[@type='submit']` or a symbolic object-repository
//! name such as `@login.submit`. This module turns those strings into a typed
//! [`Locator`] and renders it into the strategy/value pair a WebDriver or
//! Appium backend understands ([`Selector`]).
//!
//! # Grammar
//!
//! Prefixes are checked in order and the first match wins:
//!
//! | Input | Strategy |
//! |---|---|
//! | `/…` or `(/…` | [`Strategy::XPath`] (verbatim) |
//! | `id=v` | [`Strategy::Id`] |
//! | `name=v` | [`Strategy::Name`] |
//! | `class=v`, `text=v`, `desc=v` | native-app only, otherwise [`Strategy::Raw`] |
//! | `link=v` | [`Strategy::Link`] |
//! | `css=v` | [`Strategy::Css`] |
//! | anything else | [`Strategy::Raw`] (verbatim) |
//!
//! # Example
//!
//! ```
//! use oxcmd_core::locator::{Locator, LocatorContext, Strategy};
//!
//! let ctx = LocatorContext::web();
//! let locator = Locator::parse("id=submit", &ctx);
//! assert_eq!(locator.strategy, Strategy::Id);
//! assert_eq!(locator.value, "submit");
//!
//! let selector = locator.to_selector(&ctx);
//! assert_eq!(selector.using, "css selector");
//! assert_eq!(selector.value, "#submit");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::repository::ObjectRepository;

/// W3C `xpath` strategy.
pub const USING_XPATH: &str = "xpath";
/// W3C `css selector` strategy.
pub const USING_CSS: &str = "css selector";
/// W3C `link text` strategy.
pub const USING_LINK_TEXT: &str = "link text";
/// Appium native element id.
pub const USING_ID: &str = "id";
/// Appium legacy name strategy.
pub const USING_NAME: &str = "name";
/// Appium native class name.
pub const USING_CLASS_NAME: &str = "class name";
/// Appium accessibility id.
pub const USING_ACCESSIBILITY_ID: &str = "accessibility id";
/// Appium UiAutomator selector (Android).
pub const USING_ANDROID_UIAUTOMATOR: &str = "-android uiautomator";
/// Appium predicate string (iOS).
pub const USING_IOS_PREDICATE: &str = "-ios predicate string";

/// Target platform of the automation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Web,
    Android,
    Ios,
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "" => Ok(Platform::Web),
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Web => f.write_str("web"),
            Platform::Android => f.write_str("android"),
            Platform::Ios => f.write_str("ios"),
        }
    }
}

/// Where locators are evaluated: a web page or a native application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocatorContext {
    pub platform: Platform,
    /// True while a mobile session is in the `NATIVE_APP` context.
    pub native: bool,
}

impl LocatorContext {
    /// A plain browser session.
    pub fn web() -> Self {
        Self { platform: Platform::Web, native: false }
    }

    /// A mobile session in the native-app context.
    pub fn native(platform: Platform) -> Self {
        Self { platform, native: platform != Platform::Web }
    }

    /// Whether native-only selectors apply.
    pub fn is_native_app(&self) -> bool {
        self.native && self.platform != Platform::Web
    }
}

/// Element matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    XPath,
    Id,
    Css,
    Name,
    Link,
    Class,
    Text,
    Description,
    /// No prefix matched; the value is used verbatim.
    Raw,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::XPath => "xpath",
            Strategy::Id => "id",
            Strategy::Css => "css",
            Strategy::Name => "name",
            Strategy::Link => "link",
            Strategy::Class => "class",
            Strategy::Text => "text",
            Strategy::Description => "description",
            Strategy::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// A parsed element locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub strategy: Strategy,
    pub value: String,
}

/// A locator rendered for a driver: a W3C/Appium `using` strategy and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selector {
    pub using: &'static str,
    pub value: String,
}

impl Selector {
    pub fn new(using: &'static str, value: impl Into<String>) -> Self {
        Self { using, value: value.into() }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.using, self.value)
    }
}

impl Locator {
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self { strategy, value: value.into() }
    }

    /// Parses a locator string according to the grammar in the module docs.
    ///
    /// Object-repository substitution is not performed here; see
    /// [`LocatorResolver`].
    pub fn parse(raw: &str, ctx: &LocatorContext) -> Self {
        if raw.starts_with('/') || raw.starts_with("(/") {
            return Self::new(Strategy::XPath, raw);
        }
        if let Some(v) = raw.strip_prefix("id=") {
            return Self::new(Strategy::Id, v);
        }
        if let Some(v) = raw.strip_prefix("name=") {
            return Self::new(Strategy::Name, v);
        }
        if ctx.is_native_app() {
            if let Some(v) = raw.strip_prefix("class=") {
                return Self::new(Strategy::Class, v);
            }
            if let Some(v) = raw.strip_prefix("text=") {
                return Self::new(Strategy::Text, v);
            }
            if let Some(v) = raw.strip_prefix("desc=") {
                return Self::new(Strategy::Description, v);
            }
        }
        if let Some(v) = raw.strip_prefix("link=") {
            return Self::new(Strategy::Link, v);
        }
        if let Some(v) = raw.strip_prefix("css=") {
            return Self::new(Strategy::Css, v);
        }
        Self::new(Strategy::Raw, raw)
    }

    /// Renders the locator into a driver selector for the given context.
    pub fn to_selector(&self, ctx: &LocatorContext) -> Selector {
        let v = self.value.as_str();
        match (self.strategy, ctx.is_native_app(), ctx.platform) {
            (Strategy::XPath, _, _) => Selector::new(USING_XPATH, v),
            (Strategy::Css, _, _) => Selector::new(USING_CSS, v),
            (Strategy::Link, _, _) => Selector::new(USING_LINK_TEXT, v),

            (Strategy::Id, false, _) => Selector::new(USING_CSS, format!("#{}", css_ident(v))),
            (Strategy::Name, false, _) => {
                Selector::new(USING_CSS, format!("[name=\"{}\"]", escape_quoted(v)))
            }
            (Strategy::Raw, false, _) => Selector::new(USING_CSS, v),

            (Strategy::Id, true, Platform::Android) => ui_selector("resourceId", v),
            (Strategy::Class, true, Platform::Android) => ui_selector("className", v),
            (Strategy::Text, true, Platform::Android) => ui_selector("text", v),
            (Strategy::Description, true, Platform::Android) => ui_selector("description", v),

            (Strategy::Id, true, _) => Selector::new(USING_ID, v),
            (Strategy::Class, true, _) => Selector::new(USING_CLASS_NAME, v),
            (Strategy::Text, true, _) => Selector::new(
                USING_IOS_PREDICATE,
                format!("label == \"{}\"", escape_quoted(v)),
            ),
            (Strategy::Description, true, _) => Selector::new(USING_ACCESSIBILITY_ID, v),

            (Strategy::Name, true, _) => Selector::new(USING_NAME, v),
            (Strategy::Raw, true, _) => Selector::new(USING_ACCESSIBILITY_ID, v),

            // class/text/desc are only produced by `parse` in native contexts;
            // a hand-built one used on the web falls back to CSS.
            (Strategy::Class, false, _) => Selector::new(USING_CSS, format!(".{}", css_ident(v))),
            (Strategy::Text | Strategy::Description, false, _) => Selector::new(USING_CSS, v),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Strategy::XPath | Strategy::Raw => f.write_str(&self.value),
            Strategy::Description => write!(f, "desc={}", self.value),
            other => write!(f, "{}={}", other, self.value),
        }
    }
}

fn ui_selector(method: &str, value: &str) -> Selector {
    Selector::new(
        USING_ANDROID_UIAUTOMATOR,
        format!("new UiSelector().{}(\"{}\")", method, escape_quoted(value)),
    )
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escapes characters that would otherwise end a CSS identifier.
fn css_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Splits an attribute locator `locator@attribute` into its two parts.
///
/// The split happens at the last `@` only when what follows is a bare
/// attribute name, so XPath predicates such as `//a[@href='x']` stay intact.
///
/// ```
/// use oxcmd_core::locator::split_attribute_locator;
///
/// assert_eq!(
///     split_attribute_locator("id=logo@src"),
///     ("id=logo", Some("src"))
/// );
/// assert_eq!(split_attribute_locator("//a[@href='x']"), ("//a[@href='x']", None));
/// ```
pub fn split_attribute_locator(raw: &str) -> (&str, Option<&str>) {
    match raw.rfind('@') {
        Some(idx) if idx > 0 => {
            let attribute = &raw[idx + 1..];
            let is_name = !attribute.is_empty()
                && attribute
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
            if is_name {
                (&raw[..idx], Some(attribute))
            } else {
                (raw, None)
            }
        }
        _ => (raw, None),
    }
}

/// Resolves raw locator strings, substituting object-repository entries.
#[derive(Clone, Default)]
pub struct LocatorResolver {
    repository: Option<Arc<dyn ObjectRepository>>,
}

impl LocatorResolver {
    pub fn new(repository: Option<Arc<dyn ObjectRepository>>) -> Self {
        Self { repository }
    }

    /// Substitutes an object-repository entry for `raw`.
    ///
    /// `@name` is an explicit page-object reference and fails with
    /// [`CommandError::LocatorUndefined`] when no repository is attached or
    /// it has no such entry. Any other string is replaced only if it exactly
    /// names an entry.
    pub fn substitute(&self, raw: &str) -> Result<String, CommandError> {
        if let Some(name) = symbolic_name(raw) {
            return self
                .repository
                .as_ref()
                .and_then(|repo| repo.resolve(name))
                .ok_or_else(|| CommandError::LocatorUndefined(name.to_string()));
        }
        Ok(self
            .repository
            .as_ref()
            .and_then(|repo| repo.resolve(raw))
            .unwrap_or_else(|| raw.to_string()))
    }

    /// Substitutes and parses a locator string.
    pub fn resolve(&self, raw: &str, ctx: &LocatorContext) -> Result<Locator, CommandError> {
        let substituted = self.substitute(raw)?;
        Ok(Locator::parse(&substituted, ctx))
    }

    /// Parses an attribute locator `locator@attribute`.
    ///
    /// The attribute is split off first, so the locator half may itself be a
    /// page object (`@login.logo@src`). A whole string naming a repository
    /// entry is substituted before splitting.
    pub fn resolve_attribute(
        &self,
        raw: &str,
        ctx: &LocatorContext,
    ) -> Result<(Locator, String), CommandError> {
        let whole = match symbolic_name(raw) {
            Some(_) => self.substitute(raw)?,
            None => self
                .repository
                .as_ref()
                .and_then(|repo| repo.resolve(raw))
                .unwrap_or_else(|| raw.to_string()),
        };
        match split_attribute_locator(&whole) {
            (locator, Some(attribute)) => {
                Ok((self.resolve(locator, ctx)?, attribute.to_string()))
            }
            (_, None) => Err(CommandError::InvalidArgument(format!(
                "'{}' is not an attribute locator (expected locator@attribute)",
                raw
            ))),
        }
    }
}

/// Returns the page-object name of an explicit `@name` reference.
fn symbolic_name(raw: &str) -> Option<&str> {
    let name = raw.strip_prefix('@')?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'));
    valid.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MapRepository;

    fn web() -> LocatorContext {
        LocatorContext::web()
    }

    #[test]
    fn test_prefixes_strip_to_strategy() {
        let cases = [
            ("id=submit", Strategy::Id, "submit"),
            ("css=div.nav > a", Strategy::Css, "div.nav > a"),
            ("name=q", Strategy::Name, "q"),
            ("link=Sign in", Strategy::Link, "Sign in"),
        ];
        for (raw, strategy, value) in cases {
            let loc = Locator::parse(raw, &web());
            assert_eq!(loc.strategy, strategy, "strategy for {raw}");
            assert_eq!(loc.value, value, "value for {raw}");
        }
    }

    #[test]
    fn test_unprefixed_passes_through() {
        let loc = Locator::parse("button.primary", &web());
        assert_eq!(loc, Locator::new(Strategy::Raw, "button.primary"));
    }

    #[test]
    fn test_xpath_is_verbatim() {
        let loc = Locator::parse("//input[@id='q']", &web());
        assert_eq!(loc.strategy, Strategy::XPath);
        assert_eq!(loc.value, "//input[@id='q']");

        let loc = Locator::parse("(//li)[2]", &web());
        assert_eq!(loc.strategy, Strategy::XPath);
    }

    #[test]
    fn test_xpath_wins_over_prefixes() {
        // a leading slash is checked before any prefix
        let loc = Locator::parse("/id=x", &web());
        assert_eq!(loc.strategy, Strategy::XPath);
    }

    #[test]
    fn test_native_prefixes_ignored_on_web() {
        for raw in ["class=btn", "text=OK", "desc=close"] {
            let loc = Locator::parse(raw, &web());
            assert_eq!(loc, Locator::new(Strategy::Raw, raw));
        }
    }

    #[test]
    fn test_native_prefixes_in_native_app() {
        let ctx = LocatorContext::native(Platform::Android);
        assert_eq!(Locator::parse("class=android.widget.Button", &ctx).strategy, Strategy::Class);
        assert_eq!(Locator::parse("text=OK", &ctx).strategy, Strategy::Text);
        assert_eq!(Locator::parse("desc=close", &ctx), Locator::new(Strategy::Description, "close"));
    }

    #[test]
    fn test_native_prefixes_ignored_in_webview() {
        let ctx = LocatorContext { platform: Platform::Android, native: false };
        assert_eq!(Locator::parse("text=OK", &ctx).strategy, Strategy::Raw);
    }

    #[test]
    fn test_web_rendering() {
        let ctx = web();
        assert_eq!(
            Locator::parse("id=submit", &ctx).to_selector(&ctx),
            Selector::new(USING_CSS, "#submit")
        );
        assert_eq!(
            Locator::parse("name=q", &ctx).to_selector(&ctx),
            Selector::new(USING_CSS, "[name=\"q\"]")
        );
        assert_eq!(
            Locator::parse("link=Home", &ctx).to_selector(&ctx),
            Selector::new(USING_LINK_TEXT, "Home")
        );
        assert_eq!(
            Locator::parse("//a", &ctx).to_selector(&ctx),
            Selector::new(USING_XPATH, "//a")
        );
        assert_eq!(
            Locator::parse("div > p", &ctx).to_selector(&ctx),
            Selector::new(USING_CSS, "div > p")
        );
    }

    #[test]
    fn test_id_with_special_chars_is_escaped() {
        let ctx = web();
        let sel = Locator::parse("id=form:user.name", &ctx).to_selector(&ctx);
        assert_eq!(sel.value, "#form\\:user\\.name");
    }

    #[test]
    fn test_android_rendering() {
        let ctx = LocatorContext::native(Platform::Android);
        assert_eq!(
            Locator::parse("id=com.app:id/login", &ctx).to_selector(&ctx),
            Selector::new(
                USING_ANDROID_UIAUTOMATOR,
                "new UiSelector().resourceId(\"com.app:id/login\")"
            )
        );
        assert_eq!(
            Locator::parse("desc=Back", &ctx).to_selector(&ctx).value,
            "new UiSelector().description(\"Back\")"
        );
    }

    #[test]
    fn test_ios_rendering() {
        let ctx = LocatorContext::native(Platform::Ios);
        assert_eq!(
            Locator::parse("id=loginButton", &ctx).to_selector(&ctx),
            Selector::new(USING_ID, "loginButton")
        );
        assert_eq!(
            Locator::parse("text=Log \"In\"", &ctx).to_selector(&ctx),
            Selector::new(USING_IOS_PREDICATE, "label == \"Log \\\"In\\\"\"")
        );
    }

    #[test]
    fn test_split_attribute_locator() {
        assert_eq!(split_attribute_locator("id=logo@src"), ("id=logo", Some("src")));
        assert_eq!(
            split_attribute_locator("//div[@id='x']@data-role"),
            ("//div[@id='x']", Some("data-role"))
        );
        assert_eq!(split_attribute_locator("//div[@id='x']"), ("//div[@id='x']", None));
        assert_eq!(split_attribute_locator("@only"), ("@only", None));
        assert_eq!(split_attribute_locator("id=x@"), ("id=x@", None));
    }

    #[test]
    fn test_resolver_without_repository() {
        let resolver = LocatorResolver::default();
        assert_eq!(resolver.substitute("id=submit").unwrap(), "id=submit");
        assert!(matches!(
            resolver.substitute("@login.submit"),
            Err(CommandError::LocatorUndefined(ref name)) if name == "login.submit"
        ));
    }

    #[test]
    fn test_resolver_substitutes_repository_entries() {
        let mut repo = MapRepository::new();
        repo.insert("login.submit", "id=submit");
        let resolver = LocatorResolver::new(Some(Arc::new(repo)));

        let loc = resolver.resolve("@login.submit", &web()).unwrap();
        assert_eq!(loc, Locator::new(Strategy::Id, "submit"));

        // exact key match without the marker
        let loc = resolver.resolve("login.submit", &web()).unwrap();
        assert_eq!(loc, Locator::new(Strategy::Id, "submit"));

        // anything else is left alone
        assert_eq!(resolver.substitute("id=other").unwrap(), "id=other");
    }

    #[test]
    fn test_resolver_undefined_page_object() {
        let resolver = LocatorResolver::new(Some(Arc::new(MapRepository::new())));
        let err = resolver.resolve("@login.missing", &web()).unwrap_err();
        assert!(matches!(err, CommandError::LocatorUndefined(ref name) if name == "login.missing"));
    }

    #[test]
    fn test_resolver_attribute_locator() {
        let mut repo = MapRepository::new();
        repo.insert("logo", "id=logo");
        let resolver = LocatorResolver::new(Some(Arc::new(repo)));

        let (loc, attr) = resolver.resolve_attribute("css=img.logo@alt", &web()).unwrap();
        assert_eq!(loc, Locator::new(Strategy::Css, "img.logo"));
        assert_eq!(attr, "alt");

        assert!(matches!(
            resolver.resolve_attribute("id=logo", &web()),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_resolver_attribute_of_page_object() {
        let mut repo = MapRepository::new();
        repo.insert("login.logo", "id=logo");
        repo.insert("login.logo.src", "css=img.brand@src");
        let resolver = LocatorResolver::new(Some(Arc::new(repo)));

        let (loc, attr) = resolver.resolve_attribute("@login.logo@src", &web()).unwrap();
        assert_eq!(loc, Locator::new(Strategy::Id, "logo"));
        assert_eq!(attr, "src");

        let (loc, attr) = resolver.resolve_attribute("@login.logo.src", &web()).unwrap();
        assert_eq!(loc, Locator::new(Strategy::Css, "img.brand"));
        assert_eq!(attr, "src");

        assert!(matches!(
            resolver.resolve_attribute("@login.banner@src", &web()),
            Err(CommandError::LocatorUndefined(ref name)) if name == "login.banner"
        ));
        assert!(matches!(
            LocatorResolver::default().resolve_attribute("@login.logo@src", &web()),
            Err(CommandError::LocatorUndefined(_))
        ));
    }
}
