use crate::i18n::TargetLanguage;
use crate::types::reports::{CodeScaffold, MetricsDecision, RadarReport, TechBlueprint};
use crate::types::stage::Stage;

/// 文档内的小标题，中文输出使用中文，其余语言统一使用英文
fn label(lang: &TargetLanguage, zh: &'static str, en: &'static str) -> &'static str {
    match lang {
        TargetLanguage::Chinese => zh,
        _ => en,
    }
}

fn push_list(doc: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    doc.push_str(&format!("## {}\n\n", title));
    for item in items {
        doc.push_str(&format!("- {}\n", item));
    }
    doc.push('\n');
}

/// 表格单元格内不能出现换行与竖线
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

pub fn render_radar(lang: &TargetLanguage, report: &RadarReport) -> String {
    let mut doc = format!("# {}\n\n", lang.stage_title(Stage::Radar));
    doc.push_str(&format!(
        "**{}**: {}/100 | **{}**: `{}`\n\n",
        label(lang, "评分", "Score"),
        report.score,
        label(lang, "结论", "Verdict"),
        report.verdict
    ));
    doc.push_str(&format!(
        "## {}\n\n{}\n\n",
        label(lang, "市场概况", "Market Summary"),
        report.market_summary
    ));
    push_list(
        &mut doc,
        label(lang, "目标细分人群", "Target Segments"),
        &report.target_segments,
    );

    if !report.competitors.is_empty() {
        doc.push_str(&format!(
            "## {}\n\n| {} | {} |\n| --- | --- |\n",
            label(lang, "竞品", "Competitors"),
            label(lang, "名称", "Name"),
            label(lang, "弱点", "Weakness")
        ));
        for competitor in &report.competitors {
            doc.push_str(&format!(
                "| {} | {} |\n",
                cell(&competitor.name),
                cell(&competitor.weakness)
            ));
        }
        doc.push('\n');
    }

    push_list(&mut doc, label(lang, "风险", "Risks"), &report.risks);
    push_list(
        &mut doc,
        label(lang, "机会", "Opportunities"),
        &report.opportunities,
    );
    doc.push_str(&format!(
        "## {}\n\n{}\n",
        label(lang, "下一步建议", "Recommendation"),
        report.recommendation
    ));
    doc
}

/// PRD本身就是markdown，缺少一级标题时补上
pub fn render_product(lang: &TargetLanguage, prd: &str) -> String {
    let prd = prd.trim();
    if prd.starts_with("# ") {
        format!("{}\n", prd)
    } else {
        format!("# {}\n\n{}\n", lang.stage_title(Stage::Product), prd)
    }
}

pub fn render_tech(lang: &TargetLanguage, blueprint: &TechBlueprint) -> String {
    let mut doc = format!("# {}\n\n{}\n\n", lang.stage_title(Stage::Tech), blueprint.summary);

    if !blueprint.mermaid_diagram.trim().is_empty() {
        doc.push_str(&format!(
            "## {}\n\n```mermaid\n{}\n```\n\n",
            label(lang, "架构图", "Architecture Diagram"),
            blueprint.mermaid_diagram.trim()
        ));
    }

    if !blueprint.stack.is_empty() {
        doc.push_str(&format!(
            "## {}\n\n| {} | {} | {} |\n| --- | --- | --- |\n",
            label(lang, "技术栈", "Stack"),
            label(lang, "层", "Layer"),
            label(lang, "选型", "Choice"),
            label(lang, "理由", "Reason")
        ));
        for choice in &blueprint.stack {
            doc.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(&choice.layer),
                cell(&choice.choice),
                cell(&choice.reason)
            ));
        }
        doc.push('\n');
    }

    if !blueprint.components.is_empty() {
        doc.push_str(&format!("## {}\n\n", label(lang, "核心组件", "Components")));
        for component in &blueprint.components {
            doc.push_str(&format!(
                "- **{}**: {}\n",
                component.name, component.responsibility
            ));
        }
        doc.push('\n');
    }

    if !blueprint.data_entities.is_empty() {
        doc.push_str(&format!("## {}\n\n", label(lang, "数据模型", "Data Model")));
        for entity in &blueprint.data_entities {
            doc.push_str(&format!(
                "- **{}**: {}\n",
                entity.name,
                entity.fields.join(", ")
            ));
        }
        doc.push('\n');
    }

    if !blueprint.api_endpoints.is_empty() {
        doc.push_str(&format!("## {}\n\n", label(lang, "接口", "API")));
        for endpoint in &blueprint.api_endpoints {
            doc.push_str(&format!(
                "- `{} {}`: {}\n",
                endpoint.method, endpoint.path, endpoint.purpose
            ));
        }
        doc.push('\n');
    }
    doc
}

/// 脚手架索引页，文件链接指向scaffold_dir下的源码
pub fn render_scaffold(lang: &TargetLanguage, scaffold: &CodeScaffold, scaffold_dir: &str) -> String {
    let mut doc = format!(
        "# {}\n\n**{}**: {} | **{}**: {}\n\n",
        lang.stage_title(Stage::Dev),
        label(lang, "项目", "Project"),
        scaffold.project_name,
        label(lang, "语言", "Language"),
        scaffold.language
    );

    if !scaffold.setup_steps.is_empty() {
        doc.push_str(&format!("## {}\n\n", label(lang, "启动步骤", "Setup")));
        for (i, step) in scaffold.setup_steps.iter().enumerate() {
            doc.push_str(&format!("{}. {}\n", i + 1, step));
        }
        doc.push('\n');
    }

    doc.push_str(&format!("## {}\n\n", label(lang, "文件清单", "Files")));
    for file in &scaffold.files {
        let path = file.path.trim().trim_start_matches("./");
        doc.push_str(&format!("- [{}]({}/{})\n", path, scaffold_dir, path));
    }
    doc
}

pub fn render_metrics(lang: &TargetLanguage, decision: &MetricsDecision) -> String {
    let mut doc = format!(
        "# {}\n\n**{}**: `{}`\n\n",
        lang.stage_title(Stage::Qa),
        label(lang, "上线决策", "Launch Decision"),
        decision.launch_decision
    );
    doc.push_str(&format!(
        "## {}\n\n{}\n\n",
        label(lang, "北极星指标", "North Star Metric"),
        decision.north_star_metric
    ));

    if !decision.kpis.is_empty() {
        doc.push_str(&format!(
            "## KPI\n\n| {} | {} | {} |\n| --- | --- | --- |\n",
            label(lang, "指标", "Metric"),
            label(lang, "目标", "Target"),
            label(lang, "理由", "Rationale")
        ));
        for kpi in &decision.kpis {
            doc.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(&kpi.name),
                cell(&kpi.target),
                cell(&kpi.rationale)
            ));
        }
        doc.push('\n');
    }

    push_list(
        &mut doc,
        label(lang, "首批实验", "Experiments"),
        &decision.experiments,
    );
    doc.push_str(&format!(
        "## {}\n\n{}\n",
        label(lang, "决策理由", "Rationale"),
        decision.rationale
    ));
    doc
}

/// 结构化解析失败时的兜底输出
pub fn render_raw(lang: &TargetLanguage, stage: Stage, body: &str) -> String {
    format!(
        "# {}\n\n```json\n{}\n```\n",
        lang.stage_title(stage),
        body.trim()
    )
}
