use crate::config::EmitterConfig;
use anyhow::Result;
use std::io::Write;

pub type EmitResult = Result<()>;

/// Mutable state threaded through an emission: indentation plus the
/// color switch. Cheap to clone for nested scopes.
#[derive(Debug, Clone)]
pub struct EmitContext {
    pub indent_level: usize,
    pub indent_chars: String,
    pub use_colors: bool,
}

impl EmitContext {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_chars: "  ".to_string(),
            use_colors: true,
        }
    }

    pub fn from_config(config: &EmitterConfig) -> Self {
        Self {
            indent_level: 0,
            indent_chars: config.indent_style.chars(),
            use_colors: config.use_colors,
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn get_indent(&self) -> String {
        self.indent_chars.repeat(self.indent_level)
    }

    pub fn nested(&self) -> Self {
        let mut ctx = self.clone();
        ctx.indent();
        ctx
    }
}

impl Default for EmitContext {
    fn default() -> Self {
        Self::new()
    }
}

/// An emitter turns one item kind into text on a writer.
pub trait Emitter {
    type Item;

    fn emit<W: Write>(
        &self,
        item: &Self::Item,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult;

    fn emit_to_string(&self, item: &Self::Item) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::new();
        self.emit(item, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Items that know how to print themselves with default settings.
pub trait Emittable {
    fn emit<W: Write>(&self, writer: &mut W, context: &mut EmitContext) -> EmitResult;

    fn to_formatted_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::new();
        self.emit(&mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct EmitHelper;

impl EmitHelper {
    pub fn write_line<W: Write>(writer: &mut W, context: &EmitContext, text: &str) -> EmitResult {
        writeln!(writer, "{}{}", context.get_indent(), text)?;
        Ok(())
    }

    pub fn write<W: Write>(writer: &mut W, context: &EmitContext, text: &str) -> EmitResult {
        write!(writer, "{}{}", context.get_indent(), text)?;
        Ok(())
    }

    pub fn write_colored_line<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        text: &str,
        color: &str,
    ) -> EmitResult {
        if context.use_colors {
            use colored::Colorize;
            let colored_text = match color {
                "red" => text.red().to_string(),
                "green" => text.green().to_string(),
                "blue" => text.blue().to_string(),
                "yellow" => text.yellow().to_string(),
                "magenta" => text.magenta().to_string(),
                "cyan" => text.cyan().to_string(),
                "white" => text.white().to_string(),
                _ => text.to_string(),
            };
            writeln!(writer, "{}{}", context.get_indent(), colored_text)?;
        } else {
            Self::write_line(writer, context, text)?;
        }
        Ok(())
    }

    pub fn write_comment<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        comment: &str,
    ) -> EmitResult {
        Self::write_colored_line(writer, context, &format!("// {}", comment), "green")
    }

    pub fn write_section<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        title: &str,
    ) -> EmitResult {
        writeln!(writer)?;
        Self::write_colored_line(writer, context, &format!("=== {} ===", title), "cyan")?;
        Ok(())
    }

    /// `header {` ... `}` with the body one level deeper.
    pub fn write_block<W: Write, F>(
        writer: &mut W,
        context: &mut EmitContext,
        header: &str,
        body: F,
    ) -> EmitResult
    where
        F: FnOnce(&mut W, &mut EmitContext) -> EmitResult,
    {
        Self::write_line(writer, context, &format!("{} {{", header))?;
        context.indent();
        body(writer, context)?;
        context.dedent();
        Self::write_line(writer, context, "}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndentStyle;

    #[test]
    fn test_context_indentation() {
        let mut ctx = EmitContext::new();
        assert_eq!(ctx.indent_level, 0);
        assert_eq!(ctx.get_indent(), "");

        ctx.indent();
        assert_eq!(ctx.get_indent(), "  ");

        ctx.indent();
        assert_eq!(ctx.get_indent(), "    ");

        ctx.dedent();
        ctx.dedent();
        ctx.dedent();
        assert_eq!(ctx.indent_level, 0);
        assert_eq!(ctx.get_indent(), "");
    }

    #[test]
    fn test_nested_context() {
        let ctx = EmitContext::new();
        let nested = ctx.nested();

        assert_eq!(ctx.indent_level, 0);
        assert_eq!(nested.indent_level, 1);
        assert_eq!(nested.nested().indent_level, 2);
    }

    #[test]
    fn test_context_from_config() {
        let mut config = EmitterConfig::plain();
        config.indent_style = IndentStyle::Tabs;

        let mut ctx = EmitContext::from_config(&config);
        assert!(!ctx.use_colors);

        ctx.indent();
        assert_eq!(ctx.get_indent(), "\t");
    }

    #[test]
    fn test_write_line() {
        let mut buffer = Vec::new();
        let mut ctx = EmitContext::new();
        ctx.indent();

        EmitHelper::write_line(&mut buffer, &ctx, "indented line").unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "  indented line\n");
    }

    #[test]
    fn test_write_comment() {
        let mut buffer = Vec::new();
        let mut ctx = EmitContext::new();
        ctx.use_colors = false;

        EmitHelper::write_comment(&mut buffer, &ctx, "two modules").unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "// two modules\n");
    }

    #[test]
    fn test_write_section() {
        let mut buffer = Vec::new();
        let mut ctx = EmitContext::new();
        ctx.use_colors = false;

        EmitHelper::write_section(&mut buffer, &ctx, "render state").unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("=== render state ==="));
    }

    #[test]
    fn test_write_block() {
        let mut buffer = Vec::new();
        let mut ctx = EmitContext::new();
        ctx.use_colors = false;

        EmitHelper::write_block(&mut buffer, &mut ctx, "serial", |w, c| {
            EmitHelper::write_line(w, c, "%0 = const 1 : i32")
        })
        .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "serial {\n  %0 = const 1 : i32\n}\n");
    }

    #[test]
    fn test_colored_output_keeps_text() {
        let mut buffer = Vec::new();
        let mut ctx = EmitContext::new();
        ctx.use_colors = true;

        EmitHelper::write_colored_line(&mut buffer, &ctx, "compute", "cyan").unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("compute"));
    }
}
