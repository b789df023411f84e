#[cfg(feature = "completions")]
use clap::CommandFactory;

use crate::cli::{Cli, Commands, HistoryCommand, InputArgs, RulesCommand};
use crate::commands::{
    run_clean, run_history_clear, run_history_list, run_parse, run_rules_add, run_rules_export,
    run_rules_import, run_rules_list, run_rules_remove, run_rules_set_enabled, run_rules_template,
    run_rules_templates, run_rules_update, run_rules_validate, CleanOptions, HistoryOptions,
    InputSource, RuleEdit,
};
use crate::config::{load_config, render_config, ResolvedConfig};
use crate::error::Result;
use crate::logging::init_logging;
use crate::rules::RuleDraft;

impl From<InputArgs> for InputSource {
    fn from(args: InputArgs) -> Self {
        Self {
            file: args.file,
            command: args.inline,
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;
    let resolved = ResolvedConfig::from_config(&config);
    init_logging(cli.verbose, Some(resolved.log.level.as_str()));

    match cli.command {
        Commands::Clean {
            input,
            rules,
            format,
            multiline,
            no_history,
        } => {
            let defaults = &resolved.clean;
            let database = resolved.database(cli.db)?;
            let options = CleanOptions {
                input: input.into(),
                rules_file: rules,
                format: format.unwrap_or(defaults.format),
                multiline: multiline || defaults.multiline,
                record_history: !no_history && defaults.record_history,
                max_entries: resolved.history.max_entries,
            };
            run_clean(&database, &options)
        }

        Commands::Parse { input } => run_parse(&input.into()),

        Commands::Rules { command } => {
            if let RulesCommand::Templates = command {
                return run_rules_templates();
            }
            let database = resolved.database(cli.db)?;
            match command {
                RulesCommand::List { json } => run_rules_list(&database, json),
                RulesCommand::Add {
                    name,
                    action,
                    target,
                    match_mode,
                    value,
                    priority,
                    description,
                    disabled,
                } => {
                    let mut draft =
                        RuleDraft::new(name, action, target, match_mode, value, priority);
                    if let Some(description) = description {
                        draft = draft.with_description(description);
                    }
                    if disabled {
                        draft = draft.disabled();
                    }
                    run_rules_add(&database, draft)
                }
                RulesCommand::Update {
                    id,
                    name,
                    action,
                    target,
                    match_mode,
                    value,
                    priority,
                    description,
                } => {
                    let edit = RuleEdit {
                        name,
                        action,
                        target,
                        match_mode,
                        match_value: value,
                        priority,
                        description,
                    };
                    run_rules_update(&database, &id, edit)
                }
                RulesCommand::Remove { id } => run_rules_remove(&database, &id),
                RulesCommand::Enable { id } => run_rules_set_enabled(&database, &id, true),
                RulesCommand::Disable { id } => run_rules_set_enabled(&database, &id, false),
                RulesCommand::Validate { file, json } => {
                    run_rules_validate(&database, file.as_deref(), json)
                }
                RulesCommand::Import { file, mode } => run_rules_import(&database, &file, mode),
                RulesCommand::Export { output } => run_rules_export(&database, output),
                RulesCommand::Template { name } => run_rules_template(&database, &name),
                RulesCommand::Templates => run_rules_templates(),
            }
        }

        Commands::History { command } => {
            let database = resolved.database(cli.db)?;
            match command {
                HistoryCommand::List { limit, json } => {
                    let options = HistoryOptions {
                        limit: limit.unwrap_or(resolved.history.limit),
                        json,
                    };
                    run_history_list(&database, &options)
                }
                HistoryCommand::Clear => run_history_clear(&database),
            }
        }

        Commands::Config => {
            let rendered = render_config(&resolved)?;
            println!("{rendered}");
            Ok(())
        }

        #[cfg(feature = "completions")]
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "curlscrub", &mut std::io::stdout());
            Ok(())
        }
    }
}
