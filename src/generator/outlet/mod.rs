use crate::generator::context::GeneratorContext;
use crate::i18n::TargetLanguage;
use crate::types::reports::{CodeScaffold, MetricsDecision, RadarReport, TechBlueprint};
use crate::types::stage::{Stage, StageRecord};
use anyhow::Result;
use std::fs;
use std::path::Path;

pub mod render;
pub mod scaffold;

/// 保存所有阶段的产出文档
pub async fn save(context: &GeneratorContext) -> Result<()> {
    let doc_tree = DocTree::new(&context.config.target_language);
    let outlet = DiskOutlet::new(doc_tree);
    outlet.save(context).await
}

pub trait Outlet {
    async fn save(&self, context: &GeneratorContext) -> Result<()>;
}

pub struct DocTree {
    /// 阶段与文档输出相对路径的对应关系，按流水线顺序排列
    structure: Vec<(Stage, String)>,
    /// 脚手架源码的输出目录（相对路径）
    scaffold_dir: String,
}

impl DocTree {
    pub fn new(target_language: &TargetLanguage) -> Self {
        let structure = Stage::ALL
            .into_iter()
            .map(|stage| (stage, target_language.get_doc_filename(stage)))
            .collect();
        Self {
            structure,
            scaffold_dir: target_language.get_directory_name("scaffold"),
        }
    }

    pub fn scaffold_dir(&self) -> &str {
        &self.scaffold_dir
    }
}

impl Default for DocTree {
    fn default() -> Self {
        Self::new(&TargetLanguage::default())
    }
}

/// 将阶段记录渲染为markdown；结果无法按结构解析时输出原始JSON
pub fn render_stage(
    lang: &TargetLanguage,
    stage: Stage,
    record: &StageRecord,
    scaffold_dir: &str,
) -> Option<String> {
    record.result.as_ref()?;

    let rendered = match stage {
        Stage::Radar => record
            .typed_result::<RadarReport>()
            .map(|r| render::render_radar(lang, &r)),
        Stage::Product => record
            .text_result()
            .map(|prd| render::render_product(lang, &prd)),
        Stage::Tech => record
            .typed_result::<TechBlueprint>()
            .map(|r| render::render_tech(lang, &r)),
        Stage::Dev => record
            .typed_result::<CodeScaffold>()
            .map(|r| render::render_scaffold(lang, &r, scaffold_dir)),
        Stage::Qa => record
            .typed_result::<MetricsDecision>()
            .map(|r| render::render_metrics(lang, &r)),
    };

    match rendered {
        Some(doc) => Some(doc),
        None => {
            eprintln!("⚠️ 警告: 阶段 {} 的结果无法按结构解析，输出原始内容", stage);
            record
                .text_result()
                .map(|body| render::render_raw(lang, stage, &body))
        }
    }
}

pub struct DiskOutlet {
    doc_tree: DocTree,
}

impl DiskOutlet {
    pub fn new(doc_tree: DocTree) -> Self {
        Self { doc_tree }
    }

    /// 脚手架目录与Dev阶段结果保持一致：没有可用的脚手架时删除旧目录
    fn sync_scaffold(&self, output_dir: &Path, record: &StageRecord) -> Result<()> {
        let scaffold_dir = output_dir.join(self.doc_tree.scaffold_dir());
        match record.typed_result::<CodeScaffold>() {
            Some(scaffold) => {
                let written = scaffold::write_scaffold(&scaffold, &scaffold_dir)?;
                println!(
                    "💾 已写入{}个脚手架文件: {}",
                    written,
                    scaffold_dir.display()
                );
            }
            None if scaffold_dir.exists() => {
                fs::remove_dir_all(&scaffold_dir)?;
                tracing::debug!(dir = %scaffold_dir.display(), "removed stale scaffold");
            }
            None => {}
        }
        Ok(())
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, context: &GeneratorContext) -> Result<()> {
        println!("\n🖊️ 文档存储中...");
        let output_dir = &context.config.output_path;
        fs::create_dir_all(output_dir)?;

        let state = context.snapshot().await;
        let lang = &context.config.target_language;

        for (stage, relative_path) in &self.doc_tree.structure {
            let output_file_path = output_dir.join(relative_path);
            let record = state.record(*stage);

            if *stage == Stage::Dev {
                self.sync_scaffold(output_dir, record)?;
            }

            let Some(doc_markdown) = render_stage(lang, *stage, record, self.doc_tree.scaffold_dir())
            else {
                // 阶段被重置或跳过后，清理上一次运行留下的文档
                if output_file_path.exists() {
                    fs::remove_file(&output_file_path)?;
                }
                tracing::debug!(%stage, status = %record.status, "no document for stage");
                continue;
            };

            if let Some(parent_dir) = output_file_path.parent()
                && !parent_dir.exists()
            {
                fs::create_dir_all(parent_dir)?;
            }
            fs::write(&output_file_path, doc_markdown)?;
            println!("💾 已保存文档: {}", output_file_path.display());
        }

        state.save(&context.config.state_path())?;
        println!("💾 文档保存完成，输出目录: {}", output_dir.display());
        Ok(())
    }
}
