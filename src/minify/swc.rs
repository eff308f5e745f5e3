//! Minifier backed by the swc parser, optimizer and code generator.
use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::{Map, Value};

use swc_core::common::{
    comments::{Comment, CommentKind, SingleThreadedComments},
    errors::{Handler, HANDLER},
    sync::Lrc,
    BytePos, FileName, Globals, Mark, SourceMap, Span, Spanned, GLOBALS,
};
use swc_core::ecma::ast::EsVersion;
use swc_core::ecma::codegen::{text_writer::JsWriter, Config, Emitter};
use swc_core::ecma::minifier::{
    optimize,
    option::{
        terser::TerserCompressorOptions, ExtraOptions, MangleOptions,
        MinifyOptions,
    },
};
use swc_core::ecma::parser::{parse_file_as_program, Syntax};
use swc_core::ecma::transforms::base::{
    fixer::fixer, hygiene::hygiene, resolver,
};
use swc_core::ecma::visit::VisitMutWith;

use super::{Minified, MinifyError, MinifyOutput, MinifyRequest, Minifier};
use crate::comments::{self, CommentHook, CommentRecord};
use crate::config::TransformOptions;
use crate::map::{Position, ProvenanceMap};

/// Minifier using swc.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwcMinifier;

impl SwcMinifier {
    /// Create a minifier.
    pub fn new() -> Self {
        Self
    }
}

impl Minifier for SwcMinifier {
    fn minify(
        &self,
        request: MinifyRequest<'_>,
        comments: &mut dyn CommentHook,
    ) -> MinifyOutput {
        let mut warnings = Vec::new();
        let result = GLOBALS.set(&Globals::new(), || {
            let handler =
                Handler::with_emitter_writer(Box::new(std::io::sink()), None);
            HANDLER.set(&handler, || {
                transform(request, comments, &mut warnings)
            })
        });
        MinifyOutput { result, warnings }
    }
}

fn option_error(kind: &str, e: serde_json::Error) -> MinifyError {
    MinifyError::new(format!("Invalid {} options: {}", kind, e), None)
}

fn locate(cm: &SourceMap, span: Span) -> Position {
    let loc = cm.lookup_char_pos(span.lo);
    Position::new(loc.line as u32, loc.col.0 as u32)
}

fn transform(
    request: MinifyRequest<'_>,
    hook: &mut dyn CommentHook,
    warnings: &mut Vec<String>,
) -> Result<Minified, MinifyError> {
    let options = request.options;
    let syntax =
        syntax(&options.parse).map_err(|e| option_error("parse", e))?;
    let mangle =
        mangle_options(options).map_err(|e| option_error("mangle", e))?;
    let compress =
        compress_options(options).map_err(|e| option_error("compress", e))?;

    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Real(PathBuf::from(request.file)),
        request.source.to_string(),
    );

    let comments = SingleThreadedComments::default();
    let mut recovered = Vec::new();
    let parsed = parse_file_as_program(
        &fm,
        syntax,
        EsVersion::Es2022,
        Some(&comments),
        &mut recovered,
    );

    if options.warnings {
        for e in recovered.iter() {
            let pos = locate(&cm, e.span());
            warnings.push(format!(
                "{} [{}:{},{}]",
                e.kind().msg(),
                request.file,
                pos.line,
                pos.column
            ));
        }
    }

    let mut program = parsed.map_err(|e| {
        MinifyError::new(e.kind().msg(), Some(locate(&cm, e.span())))
    })?;

    let unresolved_mark = Mark::new();
    let top_level_mark = Mark::new();
    program.visit_mut_with(&mut resolver(
        unresolved_mark,
        top_level_mark,
        false,
    ));

    let minify_options = MinifyOptions {
        compress: compress.map(|c| c.into_config(cm.clone())),
        mangle,
        ..Default::default()
    };
    let mut program = optimize(
        program,
        cm.clone(),
        Some(&comments),
        None,
        &minify_options,
        &ExtraOptions {
            unresolved_mark,
            top_level_mark,
        },
    );
    if minify_options.mangle.is_none() {
        program.visit_mut_with(&mut hygiene());
    }
    program.visit_mut_with(&mut fixer(Some(&comments)));

    filter_comments(&comments, hook);

    let output = options.output.as_object();
    let output_flag = |key: &str| {
        output
            .and_then(|o| o.get(key))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    };

    let mut cfg = Config::default();
    cfg.minify = !output_flag("beautify");
    cfg.ascii_only = output_flag("ascii_only");
    cfg.target = if options.ie8 {
        EsVersion::Es5
    } else {
        EsVersion::Es2022
    };

    let mut buf = Vec::new();
    let mut src_map_buf = Vec::new();
    {
        let srcmap = if request.source_map.is_some() {
            Some(&mut src_map_buf)
        } else {
            None
        };
        let wr = JsWriter::new(cm.clone(), "\n", &mut buf, srcmap);
        let mut emitter = Emitter {
            cfg,
            cm: cm.clone(),
            comments: Some(&comments),
            wr,
        };
        emitter.emit_program(&program).map_err(|e| {
            MinifyError::new(format!("Failed to emit code: {}", e), None)
        })?;
    }

    let code = String::from_utf8(buf).map_err(|e| {
        MinifyError::new(format!("Emitted code is not UTF-8: {}", e), None)
    })?;

    let map = match request.source_map {
        Some(_) => {
            let map = cm.build_source_map(&src_map_buf);
            let mut json = Vec::new();
            map.to_writer(&mut json).map_err(|e| {
                MinifyError::new(format!("Failed to encode map: {}", e), None)
            })?;
            let map = ProvenanceMap::from_slice(&json).map_err(|e| {
                MinifyError::new(format!("Failed to decode map: {}", e), None)
            })?;
            Some(map)
        }
        None => None,
    };

    Ok(Minified { code, map })
}

/// Offer every collected comment to the hook in source order and
/// remove the comments it does not retain.
fn filter_comments(
    comments: &SingleThreadedComments,
    hook: &mut dyn CommentHook,
) {
    let (mut leading, mut trailing) = comments.borrow_all_mut();

    let mut encountered: Vec<(BytePos, CommentRecord)> = leading
        .values()
        .chain(trailing.values())
        .flatten()
        .map(|c| (c.span.lo, record(c)))
        .collect();
    encountered.sort_by_key(|(pos, _)| *pos);
    encountered.dedup_by_key(|(pos, _)| *pos);

    let dropped: HashSet<BytePos> = encountered
        .into_iter()
        .filter_map(|(pos, comment)| {
            if hook.comment(&comment) {
                None
            } else {
                Some(pos)
            }
        })
        .collect();

    for list in leading.values_mut().chain(trailing.values_mut()) {
        list.retain(|c| !dropped.contains(&c.span.lo));
    }
}

fn record(comment: &Comment) -> CommentRecord {
    let kind = match comment.kind {
        CommentKind::Block => comments::CommentKind::Block,
        CommentKind::Line => comments::CommentKind::Line,
    };
    CommentRecord {
        kind,
        text: comment.text.to_string(),
    }
}

/// Parser syntax from the `parse` options, defaulting to ecmascript.
fn syntax(parse: &Value) -> serde_json::Result<Syntax> {
    let mut obj = match parse {
        Value::Object(obj) => obj.clone(),
        _ => Map::new(),
    };
    obj.entry("syntax")
        .or_insert_with(|| Value::String("ecmascript".to_string()));
    serde_json::from_value(Value::Object(obj))
}

/// Expand `true` into an empty option object, `false` disables.
fn option_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Bool(false) => None,
        Value::Object(obj) => Some(obj.clone()),
        _ => Some(Map::new()),
    }
}

fn mangle_options(
    options: &TransformOptions,
) -> serde_json::Result<Option<MangleOptions>> {
    let mut obj = match option_object(&options.mangle) {
        Some(obj) => obj,
        None => return Ok(None),
    };
    if options.toplevel {
        obj.entry("toplevel").or_insert(Value::Bool(true));
    }
    if options.ie8 {
        obj.entry("ie8").or_insert(Value::Bool(true));
    }
    serde_json::from_value(Value::Object(obj)).map(Some)
}

fn compress_options(
    options: &TransformOptions,
) -> serde_json::Result<Option<TerserCompressorOptions>> {
    let mut obj = match option_object(&options.compress) {
        Some(obj) => obj,
        None => return Ok(None),
    };
    if options.toplevel {
        obj.entry("toplevel").or_insert(Value::Bool(true));
    }
    if options.ie8 {
        obj.entry("ie8").or_insert(Value::Bool(true));
    }
    serde_json::from_value(Value::Object(obj)).map(Some)
}
