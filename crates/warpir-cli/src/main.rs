use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;

use warpir_transform::{compile_kernel, ArgSpec, CompiledKernel, KernelSource};
use warpir_transform::{HostValue, KernelScope};

#[derive(Parser)]
#[command(name = "warpir")]
#[command(about = "WarpIR - offloading compiler for embedded GPU kernels")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a kernel bundle and print or save the offloaded IR.
    Compile {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        #[arg(long)]
        no_color: bool,

        #[arg(long)]
        no_types: bool,

        #[arg(long, conflicts_with = "verbose")]
        quiet: bool,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Check that a kernel bundle compiles.
    Validate {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Dump the structure of a compiled kernel.
    Debug {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for warpir_emit::OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => warpir_emit::OutputFormat::Text,
            Format::Json => warpir_emit::OutputFormat::Json,
        }
    }
}

/// On-disk compile request: the kernel source plus everything the host would
/// pass alongside it. Scope bindings, argument specs, and template arguments
/// all default to empty.
#[derive(Deserialize)]
struct KernelBundle {
    source: KernelSource,
    #[serde(default)]
    scope: KernelScope,
    #[serde(default)]
    arg_specs: IndexMap<String, ArgSpec>,
    #[serde(default)]
    template_args: IndexMap<String, HostValue>,
}

fn load_bundle(path: &PathBuf) -> Result<KernelBundle> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn compile_bundle(bundle: &KernelBundle) -> Result<CompiledKernel> {
    Ok(compile_kernel(
        &bundle.source,
        &bundle.scope,
        &bundle.arg_specs,
        &bundle.template_args,
    )?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            format,
            no_color,
            no_types,
            quiet,
            verbose,
        } => cmd_compile(input, output, format, no_color, no_types, quiet, verbose),
        Commands::Validate { input, verbose } => cmd_validate(input, verbose),
        Commands::Debug { input, verbose } => cmd_debug(input, verbose),
    }
}

fn cmd_compile(
    input: PathBuf,
    output: Option<PathBuf>,
    format: Format,
    no_color: bool,
    no_types: bool,
    quiet: bool,
    verbose: bool,
) -> Result<()> {
    use colored::*;
    use std::fs;
    use std::time::Instant;
    use warpir_emit::{EmitterConfig, IndentStyle, KernelEmitter, OutputFormat, VerbosityLevel};

    if verbose {
        println!("{}", "WarpIR Compiler".bright_blue().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!(" Input: {}", input.display());
        if let Some(ref out) = output {
            println!(" Output: {}", out.display());
        }
        println!();
    }

    let start = Instant::now();

    if verbose {
        println!(" Loading kernel bundle...");
    }
    let bundle = load_bundle(&input)?;

    if verbose {
        println!(" Compiling kernel...");
    }
    let compiled = compile_bundle(&bundle)?;

    if verbose {
        println!(" Emitting {} module(s)...", compiled.modules.len());
    }

    let rendered = match OutputFormat::from(format) {
        OutputFormat::Json => warpir_emit::json_string(&compiled)?,
        OutputFormat::Text => {
            let config = EmitterConfig {
                use_colors: output.is_none() && !no_color,
                indent_style: IndentStyle::Spaces(2),
                include_types: !no_types,
                verbosity: if quiet {
                    VerbosityLevel::Quiet
                } else if verbose {
                    VerbosityLevel::Verbose
                } else {
                    VerbosityLevel::Normal
                },
            };
            KernelEmitter::new(config).kernel_text(&compiled)?
        }
    };

    if let Some(output_path) = output {
        fs::write(&output_path, &rendered)?;
        if verbose {
            println!(
                "\n{} Compilation successful!",
                "SUCCESS:".bright_green().bold()
            );
            println!("   Time: {:.3}s", start.elapsed().as_secs_f64());
            println!("   Output: {}", output_path.display());
        }
    } else {
        println!("{}", rendered);
    }

    Ok(())
}

fn cmd_validate(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;

    if verbose {
        println!("{}", "Validating kernel bundle".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());
        println!(" Input: {}", input.display());
        println!();
    }

    let bundle = load_bundle(&input)?;

    match compile_bundle(&bundle) {
        Ok(compiled) => {
            println!("{}", "VALID".bright_green().bold());
            if verbose {
                println!(
                    "   {} module(s), {} temporary slot(s)",
                    compiled.modules.len(),
                    compiled.num_temporary_slots
                );
            }
            Ok(())
        }
        Err(e) => {
            println!("{}", "INVALID".bright_red().bold());
            println!("\n{}", "Compile Error:".bright_red());
            println!("{}", e);
            Err(anyhow::anyhow!("Validation failed"))
        }
    }
}

fn cmd_debug(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;
    use warpir_core::visit::for_each_stmt;
    use warpir_core::Type;
    use warpir_emit::IrFormatter;

    if verbose {
        println!("{}", "Debug kernel dump".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());
        println!(" Input: {}", input.display());
        println!();
    }

    let bundle = load_bundle(&input)?;
    let compiled = compile_bundle(&bundle)?;

    println!("Found {} module(s)\n", compiled.modules.len());

    for (idx, module) in compiled.modules.iter().enumerate() {
        let mut num_stmts = 0;
        for_each_stmt(&module.block, |_| num_stmts += 1);
        println!(
            "{}",
            format!(
                "Module {}: {}",
                idx,
                IrFormatter::format_module_kind(module.kind)
            )
            .bright_green()
            .bold()
        );
        println!("   Statements: {}", num_stmts);
    }

    println!(
        "\nArguments: {} ({} primitives)",
        compiled.arg_types.len(),
        compiled.num_arg_primitives()
    );
    if compiled.return_type != Type::Void {
        println!("Returns: {}", compiled.return_type);
    }
    println!("Temporary slots: {}", compiled.num_temporary_slots);

    if verbose && compiled.has_render_pipelines() {
        println!("\nRender pipelines: {}", compiled.render_pipelines.len());
        for (idx, pipeline) in compiled.render_pipelines.iter().enumerate() {
            println!(
                "   {}: vertex buffer {}, interpolated {}",
                idx,
                IrFormatter::format_field(&pipeline.vertex_buffer),
                pipeline.interpolated_type
            );
        }
        if let Some(pass) = &compiled.render_pass {
            println!("   Color attachments: {}", pass.color_attachments.len());
            if pass.depth_attachment.is_some() {
                println!("   Depth attachment: yes");
            }
        }
    }

    Ok(())
}
