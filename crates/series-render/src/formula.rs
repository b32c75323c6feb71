//! Math formula rendering for a small LaTeX subset.
//!
//! Covers what the theorem panels need: groups, sub/superscripts, `\frac`,
//! `\text`, `\left`/`\right`, Greek letters and a handful of operators.
//! Output is either HTML markup or plain Unicode text for terminals.
//!
//! Rendering never fails from the caller's point of view: use
//! [`render_or_fallback`] and a malformed formula comes back as its own
//! source, with the parse error logged.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{FormulaError, Result};

/// Deepest nesting of groups, command arguments and scripts the parser
/// accepts. Parsing and both emitters recurse once per level.
pub const MAX_DEPTH: usize = 64;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\[A-Za-z]+|\\.|\s+|.").unwrap());

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token<'a> {
    Command(&'a str),
    Open,
    Close,
    Sub,
    Sup,
    Space,
    Char(&'a str),
}

fn lex(src: &str) -> Vec<Token<'_>> {
    TOKEN
        .find_iter(src)
        .map(|m| match m.as_str() {
            "{" => Token::Open,
            "}" => Token::Close,
            "_" => Token::Sub,
            "^" => Token::Sup,
            s if s.starts_with('\\') => Token::Command(&s[1..]),
            s if s.trim().is_empty() => Token::Space,
            s => Token::Char(s),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Char(String),
    Symbol(&'static str),
    Operator(&'static str),
    Text(String),
    Group(Vec<Node>),
    Frac(Box<Node>, Box<Node>),
    Scripts {
        base: Box<Node>,
        sub: Option<Box<Node>>,
        sup: Option<Box<Node>>,
    },
}

fn symbol(name: &str) -> Option<Node> {
    let sym = match name {
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" | "varepsilon" => "ε",
        "theta" => "θ",
        "lambda" => "λ",
        "mu" => "μ",
        "pi" => "π",
        "rho" => "ρ",
        "sigma" => "σ",
        "tau" => "τ",
        "phi" | "varphi" => "φ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Sigma" => "Σ",
        "Pi" => "Π",
        "Omega" => "Ω",
        "sum" => "∑",
        "prod" => "∏",
        "infty" => "∞",
        "to" | "rightarrow" => "→",
        "le" | "leq" => "≤",
        "ge" | "geq" => "≥",
        "ne" | "neq" => "≠",
        "approx" => "≈",
        "cdot" => "·",
        "times" => "×",
        "pm" => "±",
        "in" => "∈",
        "ldots" | "dots" => "…",
        "cdots" => "⋯",
        "{" => "{",
        "}" => "}",
        "|" => "‖",
        "," | ";" | ":" | " " | "quad" | "\\" => " ",
        "lim" => return Some(Node::Operator("lim")),
        "ln" => return Some(Node::Operator("ln")),
        "log" => return Some(Node::Operator("log")),
        "exp" => return Some(Node::Operator("exp")),
        "max" => return Some(Node::Operator("max")),
        "min" => return Some(Node::Operator("min")),
        "sup" => return Some(Node::Operator("sup")),
        "inf" => return Some(Node::Operator("inf")),
        _ => return None,
    };
    Some(Node::Symbol(sym))
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            tokens: lex(src),
            pos: 0,
            depth: 0,
        }
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Run `f` one nesting level down, failing past [`MAX_DEPTH`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn skip_spaces(&mut self) {
        while self.tokens.get(self.pos) == Some(&Token::Space) {
            self.pos += 1;
        }
    }

    /// Parse until end of input, or until the `}` closing the current group.
    fn sequence(&mut self, in_group: bool) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(token) = self.next() {
            match token {
                Token::Close if in_group => return Ok(nodes),
                Token::Close => return Err(FormulaError::UnexpectedClose(self.pos - 1)),
                Token::Open => nodes.push(Node::Group(self.nested(|p| p.sequence(true))?)),
                Token::Sub => self.attach(&mut nodes, '_')?,
                Token::Sup => self.attach(&mut nodes, '^')?,
                Token::Space => {}
                Token::Char(c) => nodes.push(Node::Char(c.to_string())),
                Token::Command(name) => nodes.push(self.command(name)?),
            }
        }
        if in_group {
            Err(FormulaError::UnclosedGroup)
        } else {
            Ok(nodes)
        }
    }

    /// Argument of a command or script, one nesting level down.
    fn argument(&mut self, owner: &str) -> Result<Node> {
        self.nested(|p| {
            p.skip_spaces();
            match p.next() {
                Some(Token::Open) => Ok(Node::Group(p.sequence(true)?)),
                Some(Token::Char(c)) => Ok(Node::Char(c.to_string())),
                Some(Token::Command(name)) => p.command(name),
                _ => Err(FormulaError::MissingArgument(owner.to_string())),
            }
        })
    }

    /// Raw text inside `\text{...}`; whitespace is kept, braces only nest.
    fn text_argument(&mut self, owner: &str) -> Result<String> {
        self.skip_spaces();
        if self.next() != Some(Token::Open) {
            return Err(FormulaError::MissingArgument(owner.to_string()));
        }
        let mut depth = 0usize;
        let mut out = String::new();
        while let Some(token) = self.next() {
            match token {
                Token::Open => depth += 1,
                Token::Close if depth == 0 => return Ok(out),
                Token::Close => depth -= 1,
                Token::Sub => out.push('_'),
                Token::Sup => out.push('^'),
                Token::Space => out.push(' '),
                Token::Char(c) => out.push_str(c),
                Token::Command(name) => match symbol(name) {
                    Some(Node::Symbol(s)) => out.push_str(s),
                    Some(Node::Operator(s)) => out.push_str(s),
                    _ => return Err(FormulaError::UnknownCommand(name.to_string())),
                },
            }
        }
        Err(FormulaError::UnclosedGroup)
    }

    fn delimiter(&mut self, owner: &str) -> Result<Node> {
        self.skip_spaces();
        match self.next() {
            Some(Token::Char(".")) => Ok(Node::Group(Vec::new())),
            Some(Token::Char(c)) => Ok(Node::Char(c.to_string())),
            Some(Token::Command(name)) => {
                symbol(name).ok_or_else(|| FormulaError::UnknownCommand(name.to_string()))
            }
            _ => Err(FormulaError::MissingArgument(owner.to_string())),
        }
    }

    fn command(&mut self, name: &'a str) -> Result<Node> {
        match name {
            "frac" | "dfrac" => {
                let num = self.argument("\\frac")?;
                let den = self.argument("\\frac")?;
                Ok(Node::Frac(Box::new(num), Box::new(den)))
            }
            "text" | "mathrm" | "textbf" => Ok(Node::Text(self.text_argument("\\text")?)),
            "left" => self.delimiter("\\left"),
            "right" => self.delimiter("\\right"),
            _ => symbol(name).ok_or_else(|| FormulaError::UnknownCommand(name.to_string())),
        }
    }

    fn attach(&mut self, nodes: &mut Vec<Node>, kind: char) -> Result<()> {
        let script = self.argument(&kind.to_string())?;
        let (base, mut sub, mut sup) = match nodes.pop() {
            Some(Node::Scripts { base, sub, sup }) => (base, sub, sup),
            Some(other) => (Box::new(other), None, None),
            None => (Box::new(Node::Group(Vec::new())), None, None),
        };
        let slot = if kind == '_' { &mut sub } else { &mut sup };
        if slot.is_some() {
            return Err(FormulaError::DoubleScript(kind));
        }
        *slot = Some(Box::new(script));
        nodes.push(Node::Scripts { base, sub, sup });
        Ok(())
    }
}

fn parse(src: &str) -> Result<Vec<Node>> {
    Parser::new(src).sequence(false)
}

fn escape_html(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

fn emit_html(node: &Node, out: &mut String) {
    match node {
        Node::Char(c) if c.chars().all(|ch| ch.is_alphabetic()) => {
            out.push_str("<i>");
            escape_html(c, out);
            out.push_str("</i>");
        }
        Node::Char(c) => escape_html(c, out),
        Node::Symbol(s) => out.push_str(s),
        Node::Operator(name) => {
            let _ = write!(out, "<span class=\"op\">{name}</span>");
        }
        Node::Text(t) => {
            out.push_str("<span class=\"text\">");
            escape_html(t, out);
            out.push_str("</span>");
        }
        Node::Group(children) => children.iter().for_each(|c| emit_html(c, out)),
        Node::Frac(num, den) => {
            out.push_str("<span class=\"frac\"><span class=\"num\">");
            emit_html(num, out);
            out.push_str("</span><span class=\"den\">");
            emit_html(den, out);
            out.push_str("</span></span>");
        }
        Node::Scripts { base, sub, sup } => {
            emit_html(base, out);
            if let Some(sub) = sub {
                out.push_str("<sub>");
                emit_html(sub, out);
                out.push_str("</sub>");
            }
            if let Some(sup) = sup {
                out.push_str("<sup>");
                emit_html(sup, out);
                out.push_str("</sup>");
            }
        }
    }
}

fn emit_text(node: &Node, out: &mut String) {
    match node {
        Node::Char(c) | Node::Text(c) => out.push_str(c),
        Node::Symbol(s) | Node::Operator(s) => out.push_str(s),
        Node::Group(children) => children.iter().for_each(|c| emit_text(c, out)),
        Node::Frac(num, den) => {
            out.push_str(&wrapped_text(num));
            out.push('/');
            out.push_str(&wrapped_text(den));
        }
        Node::Scripts { base, sub, sup } => {
            emit_text(base, out);
            if let Some(sub) = sub {
                out.push('_');
                out.push_str(&wrapped_text(sub));
            }
            if let Some(sup) = sup {
                out.push('^');
                out.push_str(&wrapped_text(sup));
            }
        }
    }
}

/// Text of a node, parenthesized unless it is a single character.
fn wrapped_text(node: &Node) -> String {
    let mut s = String::new();
    emit_text(node, &mut s);
    if s.chars().count() > 1 {
        format!("({s})")
    } else {
        s
    }
}

/// Render to HTML markup. `display` selects block rather than inline layout.
pub fn render_html(formula: &str, display: bool) -> Result<String> {
    let nodes = parse(formula)?;
    let mut out = String::new();
    out.push_str(if display {
        "<div class=\"math math-display\">"
    } else {
        "<span class=\"math\">"
    });
    nodes.iter().for_each(|n| emit_html(n, &mut out));
    out.push_str(if display { "</div>" } else { "</span>" });
    Ok(out)
}

/// Render to plain Unicode text, e.g. `a_{n+1}` becomes `a_(n+1)`.
pub fn render_text(formula: &str) -> Result<String> {
    let nodes = parse(formula)?;
    let mut out = String::new();
    nodes.iter().for_each(|n| emit_text(n, &mut out));
    Ok(out)
}

/// HTML rendering that degrades to the escaped source on malformed input.
pub fn render_or_fallback(formula: &str, display: bool) -> String {
    match render_html(formula, display) {
        Ok(markup) => markup,
        Err(e) => {
            tracing::warn!(formula, error = %e, "formula failed to render, showing source");
            let mut out = String::from("<span class=\"math math-fallback\">");
            escape_html(formula, &mut out);
            out.push_str("</span>");
            out
        }
    }
}

/// Text rendering that degrades to the raw source on malformed input.
pub fn render_text_or_fallback(formula: &str) -> String {
    render_text(formula).unwrap_or_else(|e| {
        tracing::warn!(formula, error = %e, "formula failed to render, showing source");
        formula.to_string()
    })
}

/// A formula with both renderings attached, ready for a view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormulaBlock {
    pub source: String,
    pub markup: String,
    pub text: String,
    pub display: bool,
}

impl FormulaBlock {
    pub fn new(source: impl Into<String>, display: bool) -> Self {
        let source = source.into();
        Self {
            markup: render_or_fallback(&source, display),
            text: render_text_or_fallback(&source),
            source,
            display,
        }
    }

    pub fn inline(source: impl Into<String>) -> Self {
        Self::new(source, false)
    }

    pub fn display(source: impl Into<String>) -> Self {
        Self::new(source, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscript_text() {
        assert_eq!(render_text("a_n").unwrap(), "a_n");
        assert_eq!(render_text("a_{n+1}").unwrap(), "a_(n+1)");
    }

    #[test]
    fn test_frac_text() {
        assert_eq!(render_text(r"L = \frac{r}{1+r}").unwrap(), "L=r/(1+r)");
    }

    #[test]
    fn test_symbols() {
        assert_eq!(render_text(r"\rho \le 1").unwrap(), "ρ≤1");
        assert_eq!(render_text(r"n\to\infty").unwrap(), "n→∞");
    }

    #[test]
    fn test_text_keeps_spaces() {
        assert_eq!(render_text(r"\text{ if } x").unwrap(), " if x");
    }

    #[test]
    fn test_left_right_delimiters() {
        assert_eq!(
            render_text(r"\left| \frac{a_{n+1}}{a_n} \right|").unwrap(),
            "|(a_(n+1))/(a_n)|"
        );
    }

    #[test]
    fn test_sub_and_sup() {
        assert_eq!(render_text(r"\sum_{k=1}^n a_k").unwrap(), "∑_(k=1)^na_k");
        let html = render_html("x_1^2", false).unwrap();
        assert!(html.contains("<sub>1</sub><sup>2</sup>"), "{html}");
    }

    #[test]
    fn test_html_inline_and_display() {
        let inline = render_html("b_n", false).unwrap();
        assert!(inline.starts_with("<span class=\"math\">"));
        assert!(inline.contains("<i>b</i><sub><i>n</i></sub>"));
        let display = render_html("b_n", true).unwrap();
        assert!(display.starts_with("<div class=\"math math-display\">"));
    }

    #[test]
    fn test_html_escapes_comparison() {
        let html = render_html(r"\rho < 1", false).unwrap();
        assert!(html.contains("&lt;"));
        assert!(!html.contains(" < "));
    }

    #[test]
    fn test_errors() {
        assert_eq!(render_text(r"\frac{1}{2"), Err(FormulaError::UnclosedGroup));
        assert_eq!(render_text("a}"), Err(FormulaError::UnexpectedClose(1)));
        assert_eq!(
            render_text(r"\bogus x"),
            Err(FormulaError::UnknownCommand("bogus".into()))
        );
        assert_eq!(
            render_text("a_"),
            Err(FormulaError::MissingArgument("_".into()))
        );
        assert_eq!(render_text("a_1_2"), Err(FormulaError::DoubleScript('_')));
        assert!(matches!(render_text(r"\frac{1}"), Err(FormulaError::MissingArgument(_))));
    }

    #[test]
    fn test_fallback_embeds_source() {
        let bad = r"\frac{1}{2";
        let html = render_or_fallback(bad, true);
        assert!(html.contains(bad), "{html}");
        assert!(html.contains("math-fallback"));
        assert_eq!(render_text_or_fallback(bad), bad);
    }

    #[test]
    fn test_deep_nesting_falls_back() {
        let src = "{".repeat(200_000);
        assert_eq!(render_text(&src), Err(FormulaError::TooDeep(MAX_DEPTH)));
        assert!(render_or_fallback(&src, false).contains("math-fallback"));

        let fracs = r"\frac".repeat(10_000);
        assert_eq!(render_text(&fracs), Err(FormulaError::TooDeep(MAX_DEPTH)));

        let scripts = "x^{".repeat(10_000);
        assert!(render_or_fallback(&scripts, true).contains("math-fallback"));
    }

    #[test]
    fn test_nesting_at_limit_renders() {
        let src = format!("{}x{}", "{".repeat(MAX_DEPTH), "}".repeat(MAX_DEPTH));
        assert_eq!(render_text(&src).unwrap(), "x");
        let over = format!("{}x{}", "{".repeat(MAX_DEPTH + 1), "}".repeat(MAX_DEPTH + 1));
        assert_eq!(render_text(&over), Err(FormulaError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn test_text_fallback_is_exact_source() {
        // markup fallback escapes, text fallback returns the input untouched
        let bad = r#"\rho < 1 & "x" }"#;
        assert_eq!(render_text_or_fallback(bad), bad);
        let html = render_or_fallback(bad, false);
        assert!(html.contains(r"\rho &lt; 1 &amp; &quot;x&quot; }"), "{html}");
    }

    #[test]
    fn test_fallback_escapes_markup() {
        let html = render_or_fallback("<b>}", false);
        assert!(html.contains("&lt;b&gt;}"));
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(render_text("").unwrap(), "");
    }

    #[test]
    fn test_block_carries_both_renderings() {
        let block = FormulaBlock::display(r"|R_n| \le u_{n+1}");
        assert_eq!(block.text, "|R_n|≤u_(n+1)");
        assert!(block.markup.contains("<sub>"));
        assert!(block.display);
    }
}
