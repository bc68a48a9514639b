use anyhow::{Context, Result};
use clap::Parser as ArgParser;
use filter_input::catalog::{Language, SearchType};
use filter_input::completer::FilterHelper;
use filter_input::config::{ConfigError, FilterInputConfig};
use filter_input::favorites::FavoriteStore;
use filter_input::lexer::tokenize;
use filter_input::parser::Parser;
use filter_input::session::{ChangeEvent, FilterInput};
use filter_input::sql_compiler::SqlCompiler;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(ArgParser, Debug)]
#[command(name = "filter-input")]
#[command(about = "告警/事件/处理记录/故障检索条件输入框, 支持 Tab 补全", long_about = None)]
struct Args {
    /// JSON 配置文件
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 检索类型: alert, event, action, incident
    #[arg(long = "search-type", default_value = "alert")]
    search_type: SearchType,

    /// 界面语言: zh, en (覆盖配置文件)
    #[arg(long)]
    lang: Option<Language>,

    /// 选择取值时填入 id 而不是名称
    #[arg(long = "fill-id")]
    fill_id: bool,
}

/// REPL 运行时状态
struct Repl {
    search_type: SearchType,
    session: FilterInput,
    compiler: SqlCompiler,
    store: FavoriteStore,
    last_query: Option<String>,
}

impl Repl {
    /// 提交一行检索条件: 打印分词、子句和 SQL
    fn submit(&mut self, line: &str) {
        self.session.set_value(line);
        self.session.focus(line.len());
        if let Some(event) = self.session.commit() {
            self.run(event);
        }
    }

    /// 重新执行一条最近搜索或收藏
    fn replay(&mut self, query: Option<String>) {
        match query.and_then(|query| self.session.select_saved_query(&query)) {
            Some(event) => self.run(event),
            None => println!("⚠️ 没有找到对应的检索条件"),
        }
    }

    fn run(&mut self, event: ChangeEvent) {
        println!("\n[输入]: {}", event.query);

        // 1. 词法分析
        let tokens = tokenize(&event.query);
        println!("[步骤 1]: 生成了 {} 个 token", tokens.len());
        for token in &tokens {
            println!(
                "  {:<10} {:<20} {}..{}",
                token.data_type.as_str(),
                token.text,
                token.span.start,
                token.span.end
            );
        }

        // 2. 语法分析
        let mut parser = Parser::new(&tokens).with_candidates(self.session.candidates());
        let query = match parser.parse() {
            Ok(query) => query,
            Err(e) => {
                match e.span {
                    Some(span) => println!("❌ 解析失败: {} (位置 {}..{})", e, span.start, span.end),
                    None => println!("❌ 解析失败: {}", e),
                }
                return;
            }
        };
        println!("[步骤 2]: 解析出 {} 个子句", query.clauses.len());
        for (index, clause) in query.clauses.iter().enumerate() {
            match index.checked_sub(1).and_then(|i| query.connectives.get(i)) {
                Some(connective) => println!("  {:?} {:?}", connective, clause),
                None => println!("  {:?}", clause),
            }
        }

        // 3. 编译为 SQL
        match self.compiler.compile(&query) {
            Ok(sql) => println!("[步骤 3]: SQL\n{}\n", sql),
            Err(e) => println!("❌ SQL编译失败: {}", e),
        }

        self.store.record_search(self.search_type, &event.query);
        self.last_query = Some(event.query);
    }

    /// 处理 `:` 开头的命令, 返回 false 表示退出
    fn command(&mut self, line: &str) -> bool {
        let (name, arg) = line.split_once(' ').unwrap_or((line, ""));
        let arg = arg.trim();
        match name {
            ":quit" | ":q" => return false,
            ":history" => {
                for (index, query) in self.store.history(self.search_type).iter().enumerate() {
                    println!("  {}. {}", index + 1, query);
                }
            }
            ":favs" => {
                for favorite in self.store.favorites(self.search_type) {
                    println!("  [{}] {}: {}", favorite.id, favorite.name, favorite.query_string);
                }
            }
            ":h" => match arg.parse::<usize>() {
                Ok(index) => {
                    let query = index
                        .checked_sub(1)
                        .and_then(|i| self.store.history(self.search_type).get(i))
                        .cloned();
                    self.replay(query);
                }
                Err(_) => println!("用法: :h <序号>"),
            },
            ":use" => match arg.parse::<u64>() {
                Ok(id) => {
                    let query = self
                        .store
                        .favorites(self.search_type)
                        .iter()
                        .find(|favorite| favorite.id == id)
                        .map(|favorite| favorite.query_string.clone());
                    self.replay(query);
                }
                Err(_) => println!("用法: :use <id>"),
            },
            ":fav" => match &self.last_query {
                Some(query) => match self.store.create(self.search_type, arg, query) {
                    Ok(favorite) => println!("✅ 已收藏 [{}] {}", favorite.id, favorite.name),
                    Err(e) => println!("❌ {}", e),
                },
                None => println!("⚠️ 还没有提交过检索条件"),
            },
            ":rename" => {
                let (id, new_name) = arg.split_once(' ').unwrap_or((arg, ""));
                match id.parse::<u64>() {
                    Ok(id) => match self.store.rename(self.search_type, id, new_name) {
                        Ok(()) => println!("✅ 已重命名"),
                        Err(e) => println!("❌ {}", e),
                    },
                    Err(_) => println!("用法: :rename <id> <名称>"),
                }
            }
            ":unfav" => match arg.parse::<u64>() {
                Ok(id) => match self.store.delete(self.search_type, id) {
                    Ok(favorite) => println!("✅ 已删除收藏 {}", favorite.name),
                    Err(e) => println!("❌ {}", e),
                },
                Err(_) => println!("用法: :unfav <id>"),
            },
            _ => println!("未知命令: {} (可用: :fav <名称>, :favs, :use <id>, :rename <id> <名称>, :unfav <id>, :history, :h <序号>, :quit)", name),
        }
        true
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => match FilterInputConfig::from_json_file(path) {
            Ok(config) => config,
            Err(ConfigError::NotFound(path)) => {
                warn!(path = %path.display(), "config file not found, using defaults");
                FilterInputConfig::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("无法加载配置文件 {}", path.display()))
            }
        },
        None => FilterInputConfig::default(),
    };
    if let Some(lang) = args.lang {
        config.language = lang;
    }
    let fill_id = args.fill_id || config.fill_id;
    debug!(?config, "configuration loaded");

    let candidates = config.candidates(args.search_type);
    let store = match &config.favorites_path {
        Some(path) => FavoriteStore::load(path, config.history_limit)
            .with_context(|| format!("无法加载收藏文件 {}", path.display()))?,
        None => FavoriteStore::in_memory(config.history_limit),
    };

    let mut repl = Repl {
        search_type: args.search_type,
        session: FilterInput::new(args.search_type, candidates.clone())
            .with_language(config.language)
            .with_fill_id(fill_id),
        compiler: SqlCompiler::from_config(&config, args.search_type),
        store,
        last_query: None,
    };

    println!("--- 检索条件输入 ({}) ---", args.search_type);
    println!("Tab 补全字段/方法/取值/连接词, 回车提交, :quit 退出\n");

    let mut editor: Editor<FilterHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(FilterHelper::new(candidates, config.language, fill_id)));

    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed)?;
                if trimmed.starts_with(':') {
                    if !repl.command(trimmed) {
                        break;
                    }
                } else {
                    repl.submit(&line);
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("读取输入失败"),
        }
    }

    if let Err(e) = repl.store.save() {
        warn!(error = %e, "failed to save favorites");
    }
    Ok(())
}
