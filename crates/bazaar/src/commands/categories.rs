//! Category handlers.

use std::path::Path;

use tabled::Tabled;

use bazaar_api::models::{Category, CategoryForm, CategoryImage};
use bazaar_core::{Command as CoreCommand, Console, Resource};

use crate::cli::{CategoriesArgs, CategoriesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Image")]
    image: String,
}

impl CategoryRow {
    fn new(c: &Category) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            description: util::opt(c.description.as_ref()),
            image: util::opt(c.image.as_ref()),
        }
    }
}

fn image(path: &Path) -> Result<CategoryImage, CliError> {
    CategoryImage::from_path(path).map_err(CliError::from)
}

pub async fn handle(
    console: &Console,
    args: CategoriesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CategoriesCommand::List => {
            let categories: Vec<Category> = console.fetch_as(&Resource::Categories).await?;
            let out = output::render_list(
                global.output,
                &categories,
                CategoryRow::new,
                |c| c.id.clone(),
            );
            output::print_output(&out, global.quiet);
        }

        CategoriesCommand::Add {
            name,
            description,
            image: path,
        } => {
            let mut form = CategoryForm::new(name.clone(), description);
            if let Some(path) = path {
                form = form.with_image(image(&path)?);
            }
            console.execute(CoreCommand::AddCategory { form }).await?;
            output::print_done(&format!("Category '{name}' created"), global.quiet);
        }

        CategoriesCommand::Edit {
            id,
            name,
            description,
            image: path,
        } => {
            let form = CategoryForm {
                name,
                description,
                image: path.as_deref().map(image).transpose()?,
            };
            console
                .execute(CoreCommand::EditCategory {
                    id: id.clone(),
                    form,
                })
                .await?;
            output::print_done(&format!("Category {id} updated"), global.quiet);
        }

        CategoriesCommand::Delete { id } => {
            if !util::confirm(
                &format!("Delete category '{id}'?"),
                "categories delete",
                global.yes,
            )? {
                return Ok(());
            }
            console
                .execute(CoreCommand::DeleteCategory { id: id.clone() })
                .await?;
            output::print_done(&format!("Category {id} deleted"), global.quiet);
        }
    }
    Ok(())
}
