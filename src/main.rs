use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use search_plan::config::{CompilerConfig, SchemaConfig};
use search_plan::SearchCompiler;
use tracing_subscriber::EnvFilter;

const DEFAULT_SCHEMA_PATH: &str = "schema.json";
const DEFAULT_MODEL: &str = "Host";

/// 加载模型配置，优先使用JSON配置，失败时使用默认配置
fn load_schema_config(path: &str) -> SchemaConfig {
    match SchemaConfig::from_json_file(path) {
        Ok(config) => {
            println!("✅ 成功从JSON配置文件加载模型: {}", path);
            config
        }
        Err(e) => {
            tracing::warn!(error = %e, "falling back to built-in schema");
            println!("⚠️ 无法加载JSON配置文件 ({}), 使用默认配置", e);
            SchemaConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("--- search_plan {}: 搜索关联规划 ---", env!("CARGO_PKG_VERSION"));

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SCHEMA_PATH.to_string());
    let schema_config = load_schema_config(&path);
    let compiler = SearchCompiler::from_config(&schema_config, CompilerConfig::default())
        .context("invalid schema configuration")?;

    // 显示当前可用的模型
    println!("\n[配置信息]:");
    println!("可用模型: {}", compiler.resolver().model_names().join(", "));
    println!("最大嵌套深度: {}", compiler.config().max_depth);
    println!("输入搜索字符串，例如: services.name:ssh name:web01");
    println!("命令: :model <名称> 切换模型, :quit 退出\n");

    let mut model = DEFAULT_MODEL.to_string();
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;

    loop {
        let line = match editor.readline(&format!("{}> ", model)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if let Err(e) = editor.add_history_entry(input) {
            tracing::debug!(error = %e, "failed to record history entry");
        }

        if input == ":quit" || input == ":q" {
            break;
        }
        if let Some(name) = input.strip_prefix(":model") {
            let name = name.trim();
            if compiler.resolver().has_model(name) {
                model = name.to_string();
            } else {
                println!("✗ 未知模型: {}", name);
            }
            continue;
        }

        match compiler.compile(input, &model) {
            Ok(result) => {
                println!("AST 结构: {:#?}", result.tree);
                println!("joins:    {:?}", result.join_names());
                println!("includes: {:?}", result.include_names());
            }
            Err(e) => {
                println!("✗ 编译失败: {}", e);
                if let search_plan::CompileError::Parse(parse_error) = &e {
                    if let Some(span) = parse_error.span {
                        println!("  位置 {}-{}", span.start, span.end);
                    }
                }
            }
        }
    }

    Ok(())
}
