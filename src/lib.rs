pub mod ast;
pub mod cli;
pub mod clock;
pub mod drawio;
pub mod ir;
pub mod layout;
pub mod lexer;
pub mod locator;
pub mod measure;
pub mod parser;
pub mod serializer;
pub mod style;

use log::debug;
use wasm_bindgen::prelude::*;

use clock::{Clock, SystemClock};
use drawio::{DrawioRenderer, RenderError};
use ir::{SchemaError, SchemaIR};
use layout::LayoutEngine;
use locator::LocateError;
use parser::{ParseError, ParseMode, Parser};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Locate error: {0}")]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub mode: ParseMode,
}

impl Options {
    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Run the whole pipeline: parse, resolve, lay out, render.
///
/// Nothing is written anywhere; the caller decides what to do with the
/// document.
pub fn convert<C: Clock>(source: &str, options: &Options, clock: C) -> Result<String, Error> {
    let diagram = Parser::new(source).with_mode(options.mode).parse()?;
    let ir = SchemaIR::resolve(&diagram)?;
    let layout = LayoutEngine::default().layout(&ir);
    let xml = DrawioRenderer::with_clock(clock).render(&ir, &layout)?;
    debug!("rendered {} bytes", xml.len());
    Ok(xml)
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Render ERD source to a draw.io document
#[wasm_bindgen(js_name = "erdToDrawio")]
pub fn render_drawio(source: &str, lenient: Option<bool>) -> Result<String, String> {
    let mode = if lenient.unwrap_or(false) {
        ParseMode::Lenient
    } else {
        ParseMode::Strict
    };
    convert(source, &Options::default().with_mode(mode), SystemClock).map_err(|e| e.to_string())
}
