//! `difftrack images` command - group micrograph files by day and dish

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::output::print_structured;
use crate::cli::table::TextTable;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::images::{scan_images, DayImages, ImageGrouper, DEFAULT_PER_DAY, DEFAULT_PER_DISH};

#[derive(clap::Args, Debug)]
pub struct ImagesArgs {
    /// Directory holding .jpg/.jpeg/.png files
    pub dir: PathBuf,

    /// Day marker in file names, as in `_D7_` (defaults to the configured prefix)
    #[arg(long, short = 'p')]
    pub prefix: Option<String>,

    /// Images kept per dish
    #[arg(long, default_value_t = DEFAULT_PER_DISH)]
    pub per_dish: usize,

    /// Images kept per day when no dish is named
    #[arg(long, default_value_t = DEFAULT_PER_DAY)]
    pub per_day: usize,

    /// Only files tagged `DIF{ID}_`
    #[arg(long, short = 'b')]
    pub batch: Option<u32>,
}

pub fn run(args: ImagesArgs, global: &GlobalOpts) -> Result<()> {
    let prefix = match args.prefix {
        Some(prefix) => prefix,
        None => Config::load().map_err(|e| miette::miette!("{}", e))?.image_prefix,
    };
    let grouper = ImageGrouper::new(&prefix, args.per_dish, args.per_day)
        .map_err(|e| miette::miette!("{}", e))?;

    let names: Vec<String> = scan_images(&args.dir)
        .map_err(|e| miette::miette!("{}", e))?
        .into_iter()
        .filter(|name| args.batch.is_none_or(|id| grouper.batch_of(name) == Some(id)))
        .collect();
    let groups = grouper.group(&names);

    if print_structured(&groups, global.output)? {
        return Ok(());
    }
    if groups.is_empty() {
        println!("No images found in {}", args.dir.display());
        return Ok(());
    }

    match global.output {
        OutputFormat::Auto => {
            for group in &groups {
                println!(
                    "{} {}",
                    style(group.day).bold(),
                    style(format!("({} shown)", group.file_count())).dim()
                );
                match &group.images {
                    DayImages::Dishes(dishes) => {
                        for (dish, files) in dishes {
                            println!("  {}", style(dish).yellow());
                            for file in files {
                                println!("    {}", file);
                            }
                        }
                    }
                    DayImages::Flat(files) => {
                        for file in files {
                            println!("  {}", file);
                        }
                    }
                }
            }
        }
        format => {
            let mut table = TextTable::new(["DAY", "DISH", "FILE"]);
            for group in &groups {
                match &group.images {
                    DayImages::Dishes(dishes) => {
                        for (dish, files) in dishes {
                            for file in files {
                                table.push([group.day.to_string(), dish.to_string(), file.clone()]);
                            }
                        }
                    }
                    DayImages::Flat(files) => {
                        for file in files {
                            table.push([group.day.to_string(), String::new(), file.clone()]);
                        }
                    }
                }
            }
            table.print(format)?;
        }
    }
    Ok(())
}
