//! Newick reader. Only names, branch lengths and topology are kept;
//! bracketed comments (including NHX) are accepted and dropped.

use super::error::TreeError;
use super::node::NodeId;
use super::tree::Tree;
use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while},
    character::complete::{char, digit1, multispace0},
    combinator::{cut, map, map_res, opt, recognize},
    error::{context, ContextError, ErrorKind, FromExternalError, ParseError},
    multi::{many0, many1},
    sequence::{delimited, preceded},
    IResult, Offset, Parser,
};

#[derive(Clone, Debug, PartialEq)]
enum ErrorFrame {
    Context(&'static str),
    Nom(ErrorKind),
}

/// nom error that keeps the whole stack of contexts, for readable messages.
#[derive(Clone, Debug, PartialEq)]
struct NewickError<'a> {
    frames: Vec<(&'a str, ErrorFrame)>,
}

impl<'a> ParseError<&'a str> for NewickError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        NewickError {
            frames: vec![(input, ErrorFrame::Nom(kind))],
        }
    }

    fn append(input: &'a str, kind: ErrorKind, mut other: Self) -> Self {
        other.frames.push((input, ErrorFrame::Nom(kind)));
        other
    }
}

impl<'a> ContextError<&'a str> for NewickError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.frames.push((input, ErrorFrame::Context(ctx)));
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for NewickError<'a> {
    fn from_external_error(input: &'a str, kind: ErrorKind, _e: E) -> Self {
        NewickError {
            frames: vec![(input, ErrorFrame::Nom(kind))],
        }
    }
}

type PResult<'a, O> = IResult<&'a str, O, NewickError<'a>>;

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

// Unquoted labels stop at structural characters; quoted ones use doubled quotes as escapes.
fn label(input: &str) -> PResult<'_, String> {
    let unquoted = map(take_while(|c: char| !"():;,[]".contains(c)), |s: &str| {
        s.trim().to_string()
    });
    let single_quoted = delimited(
        char('\''),
        map(is_not("'"), |s: &str| s.replace("''", "'")),
        char('\''),
    );
    let double_quoted = delimited(
        char('"'),
        map(is_not("\""), |s: &str| s.replace("\"\"", "\"")),
        char('"'),
    );

    context("label", alt((single_quoted, double_quoted, unquoted))).parse(input)
}

fn length(input: &str) -> PResult<'_, f64> {
    context(
        "length",
        preceded(
            ws(char(':')),
            cut(map_res(
                recognize((
                    opt(alt((char('-'), char('+')))),
                    digit1,
                    opt((char('.'), opt(digit1))),
                    opt((
                        alt((char('e'), char('E'))),
                        opt(alt((char('+'), char('-')))),
                        digit1,
                    )),
                )),
                |s: &str| s.parse::<f64>(),
            )),
        ),
    )
    .parse(input)
}

fn comments(input: &str) -> PResult<'_, ()> {
    map(
        many0(ws(delimited(char('['), take_while(|c| c != ']'), char(']')))),
        |_| (),
    )
    .parse(input)
}

fn symbol<'a>(c: char) -> impl Parser<&'a str, Output = char, Error = NewickError<'a>> {
    ws(char(c))
}

fn attach(tree: &mut Tree, parent: Option<NodeId>, id: NodeId) {
    if let Some(parent) = parent {
        tree.nodes[id].parent = Some(parent);
        tree.nodes[parent].children.push(id);
    }
}

// label[comment]:length[comment], after a leaf or a closing `)`
fn annotate<'a>(
    input: &'a str,
    tree: &mut Tree,
    id: NodeId,
) -> Result<&'a str, nom::Err<NewickError<'a>>> {
    let (input, name) = opt(label).parse(input)?;
    let (input, _) = comments(input)?;
    let (input, length) = opt(length).parse(input)?;
    let (input, _) = comments(input)?;

    if let Some(node) = tree.get_node_mut(id) {
        node.name = name.filter(|s| !s.is_empty());
        node.length = length;
    }
    Ok(input)
}

/// One tree up to and including its `;`.
///
/// Nesting is tracked on an explicit stack of open `(`, so depth is limited by memory only.
/// Parents get lower ids than their children, siblings are numbered left to right.
fn newick(input: &str) -> PResult<'_, Tree> {
    let mut tree = Tree::new();
    // internal nodes whose `)` is still ahead
    let mut open: Vec<NodeId> = vec![];
    let (mut input, _) = multispace0::<_, NewickError>(input)?;

    loop {
        // every `(` opens a child of the innermost open node
        loop {
            let (rest, opened) = opt(symbol('(')).parse(input)?;
            input = rest;
            if opened.is_none() {
                break;
            }
            let id = tree.add_node();
            attach(&mut tree, open.last().copied(), id);
            open.push(id);
        }

        let id = tree.add_node();
        attach(&mut tree, open.last().copied(), id);
        input = annotate(input, &mut tree, id)?;

        while let Some(&id) = open.last() {
            let (rest, closed) = opt(symbol(')')).parse(input)?;
            if closed.is_none() {
                break;
            }
            open.pop();
            input = annotate(rest, &mut tree, id)?;
        }

        if open.is_empty() {
            break;
        }
        let (rest, _) = context("children", symbol(',')).parse(input)?;
        input = rest;
    }

    let (input, _) = symbol(';').parse(input)?;
    tree.set_root(0);

    Ok((input, tree))
}

/// Parses a single Newick tree terminated by `;`.
pub fn parse_newick(input: &str) -> Result<Tree, TreeError> {
    match newick(input) {
        Ok((_, tree)) => Ok(tree),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(to_tree_error(input, e)),
        Err(nom::Err::Incomplete(_)) => Err(incomplete()),
    }
}

/// Parses every tree in `input`. Top-level bracketed blocks between trees are skipped.
pub fn parse_newick_multi(input: &str) -> Result<Vec<Tree>, TreeError> {
    let tree = map(newick, Some);
    let header = map(
        ws(delimited(char('['), take_while(|c| c != ']'), char(']'))),
        |_| None,
    );

    match many1(alt((tree, header))).parse(input) {
        Ok((_, items)) => Ok(items.into_iter().flatten().collect()),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(to_tree_error(input, e)),
        Err(nom::Err::Incomplete(_)) => Err(incomplete()),
    }
}

fn incomplete() -> TreeError {
    TreeError::ParseError {
        message: "Incomplete input".to_string(),
        line: 0,
        column: 0,
        snippet: String::new(),
    }
}

fn to_tree_error(input: &str, e: NewickError) -> TreeError {
    let remaining = e.frames.first().map(|(r, _)| *r).unwrap_or(input);
    let offset = input.offset(remaining);

    let prefix = &input[..offset];
    let line = prefix.chars().filter(|&c| c == '\n').count() + 1;
    let last_newline = prefix.rfind('\n').map(|p| p + 1).unwrap_or(0);
    let column = offset - last_newline + 1;

    let mut message = String::new();
    for (_, frame) in e.frames.iter().rev() {
        match frame {
            ErrorFrame::Context(ctx) => message.push_str(&format!("while parsing {}:\n", ctx)),
            ErrorFrame::Nom(k) => message.push_str(&format!("  error: {:?}\n", k)),
        }
    }

    TreeError::ParseError {
        message,
        line,
        column,
        snippet: remaining.chars().take(50).collect(),
    }
}

impl Tree {
    /// Parse a Newick string into a Tree.
    ///
    /// ```
    /// use msav::libs::phylo::Tree;
    ///
    /// let tree = Tree::from_newick("(A:0.1,B:0.2)Root;").unwrap();
    /// assert_eq!(tree.len(), 3);
    ///
    /// assert!(Tree::from_newick("(A,B:invalid)C;").is_err());
    /// ```
    pub fn from_newick(input: &str) -> Result<Self, TreeError> {
        parse_newick(input)
    }

    pub fn from_newick_multi(input: &str) -> Result<Vec<Self>, TreeError> {
        parse_newick_multi(input)
    }
}
