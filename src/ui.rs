use crate::history::HistoryLog;
use crate::model::{HistoryEntry, PredictionRequest, PredictionResult, ShoppingCategory};
use crate::predictor::{PredictionSlot, Predictor};
use crate::stats::{currency_code, summarize, HistorySummary};
use crate::storage::SqliteStorage;
use chrono::{Local, TimeZone};
use eframe::egui;
use egui::{Color32, Context, FontFamily, FontId, Margin, RichText, Stroke, Vec2, Visuals};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Plot};
use std::time::Duration;

const ACCENT: Color32 = Color32::from_rgb(79, 70, 229);
const INK: Color32 = Color32::from_rgb(15, 23, 42);
const MUTED: Color32 = Color32::from_rgb(100, 116, 139);
const GOOD: Color32 = Color32::from_rgb(22, 101, 52);
const BAD: Color32 = Color32::from_rgb(153, 27, 27);

const CHART_COLORS: [Color32; 8] = [
    Color32::from_rgb(99, 102, 241),
    Color32::from_rgb(139, 92, 246),
    Color32::from_rgb(236, 72, 153),
    Color32::from_rgb(244, 63, 94),
    Color32::from_rgb(249, 115, 22),
    Color32::from_rgb(234, 179, 8),
    Color32::from_rgb(34, 197, 94),
    Color32::from_rgb(6, 182, 212),
];

pub fn set_custom_style(ctx: &Context) {
    // Light slate + indigo theme
    let mut visuals = Visuals::light();

    visuals.panel_fill = Color32::from_rgb(248, 250, 252);
    visuals.window_fill = Color32::WHITE;
    visuals.extreme_bg_color = Color32::WHITE;
    visuals.faint_bg_color = Color32::from_rgb(241, 245, 249);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(226, 232, 240);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, Color32::from_rgb(203, 213, 225));

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(224, 231, 255);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.5, ACCENT);

    visuals.widgets.active.bg_fill = Color32::from_rgb(199, 210, 254);
    visuals.widgets.active.bg_stroke = Stroke::new(2.0, ACCENT);

    visuals.selection.bg_fill = Color32::from_rgb(199, 210, 254);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();

    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.spacing.window_margin = Margin::same(16);
    style.spacing.button_padding = egui::vec2(14.0, 8.0);

    style.text_styles.insert(
        egui::TextStyle::Body,
        FontId::new(15.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Heading,
        FontId::new(22.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Small,
        FontId::new(12.0, FontFamily::Proportional),
    );

    ctx.set_style(style);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tab {
    Predict,
    History,
}

pub struct ShopWiseApp {
    predictor: Predictor,
    history: HistoryLog<SqliteStorage>,
    slot: PredictionSlot,

    form: PredictionRequest,
    tab: Tab,

    // Result on screen with the request that produced it
    shown: Option<(PredictionRequest, PredictionResult)>,
    error: Option<String>,

    search: String,
    confirm_clear: bool,
}

impl ShopWiseApp {
    pub fn new(predictor: Predictor, history: HistoryLog<SqliteStorage>) -> Self {
        Self {
            predictor,
            history,
            slot: PredictionSlot::default(),

            form: PredictionRequest::default(),
            tab: Tab::Predict,

            shown: None,
            error: None,

            search: String::new(),
            confirm_clear: false,
        }
    }

    fn submit(&mut self) {
        if !self.form.is_submittable() {
            return;
        }
        if self.slot.submit(&self.predictor, self.form.clone()) {
            self.error = None;
        }
    }

    fn poll_prediction(&mut self) {
        let Some((request, outcome)) = self.slot.poll() else {
            return;
        };
        match outcome {
            Ok(result) => {
                tracing::info!(total = result.estimated_total, status = ?result.budget_status, "prediction ready");
                self.history
                    .append(HistoryEntry::new(request.clone(), result.clone()));
                self.shown = Some((request, result));
            }
            Err(e) => {
                tracing::warn!(error = %e, "prediction failed");
                self.error = Some(e.to_string());
            }
        }
    }

    fn reset(&mut self) {
        self.shown = None;
        self.error = None;
    }

    fn open_entry(&mut self, id: &str) {
        if let Some(entry) = self.history.get(id) {
            self.form = entry.form_data.clone();
            self.shown = Some((entry.form_data.clone(), entry.result.clone()));
            self.error = None;
            self.tab = Tab::Predict;
        }
    }

    fn tab_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.tab, Tab::Predict, RichText::new("Predict Price").strong());
            let label = if self.history.is_empty() {
                "Recent History".to_string()
            } else {
                format!("Recent History ({})", self.history.len())
            };
            ui.selectable_value(&mut self.tab, Tab::History, RichText::new(label).strong());
        });
    }

    fn error_banner(&self, ui: &mut egui::Ui) {
        if let Some(err) = &self.error {
            egui::Frame::new()
                .fill(Color32::from_rgb(254, 242, 242))
                .stroke(Stroke::new(1.0, Color32::from_rgb(254, 202, 202)))
                .inner_margin(Margin::same(12))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(RichText::new(format!("⚠ {err}")).color(BAD));
                });
            ui.add_space(8.0);
        }
    }

    fn form_ui(&mut self, ui: &mut egui::Ui) {
        let busy = self.slot.is_busy();

        card(ui, |ui| {
            ui.label(RichText::new("How much are you planning to spend? (Rupees ₹)").strong());
            ui.add(
                egui::DragValue::new(&mut self.form.budget)
                    .prefix("₹ ")
                    .speed(10.0)
                    .range(1.0..=100_000_000.0),
            );

            ui.add_space(6.0);
            ui.label(RichText::new("What category is this shopping for?").strong());
            egui::ComboBox::from_id_salt("category")
                .selected_text(self.form.category.label().to_string())
                .width(260.0)
                .show_ui(ui, |ui| {
                    for cat in ShoppingCategory::ALL {
                        let label = cat.label().to_string();
                        ui.selectable_value(&mut self.form.category, cat, label);
                    }
                });

            ui.add_space(6.0);
            ui.label(RichText::new("Describe your list or bill details").strong());
            ui.add(
                egui::TextEdit::multiline(&mut self.form.bill_details)
                    .hint_text("e.g. 2kg Basmati Rice, 1L Sunflower Oil, 500g Chicken, some spices...")
                    .desired_rows(5)
                    .desired_width(f32::INFINITY),
            );
            ui.label(
                RichText::new("Example: \"I want to buy 3 t-shirts, a pair of jeans, and some socks from a mall.\"")
                    .small()
                    .italics()
                    .color(MUTED),
            );

            ui.add_space(8.0);
            let can_submit = !busy && self.form.is_submittable();
            ui.horizontal(|ui| {
                let text = if busy { "Analyzing Your List..." } else { "Predict Total Price" };
                let button = egui::Button::new(RichText::new(text).color(Color32::WHITE).strong())
                    .fill(ACCENT);
                if ui
                    .add_enabled_ui(can_submit, |ui| ui.add_sized(Vec2::new(220.0, 36.0), button))
                    .inner
                    .clicked()
                {
                    self.submit();
                }
                if busy {
                    ui.add(egui::Spinner::new());
                }
            });
        });
    }

    fn result_ui(&mut self, ui: &mut egui::Ui) {
        let Some((request, result)) = &self.shown else {
            return;
        };
        let budget = request.budget;
        let over = result.is_over_budget(budget);
        let gap = result.budget_gap(budget);
        let currency = result.currency.as_str();

        let mut go_back = false;
        ui.horizontal(|ui| {
            if ui.button(RichText::new("← New Prediction").color(ACCENT).strong()).clicked() {
                go_back = true;
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("📋").on_hover_text("Copy prediction").clicked() {
                    ui.ctx().copy_text(copy_text(request, result));
                }
                ui.label(RichText::new(format!("Result for {}", request.category)).color(MUTED));
            });
        });

        ui.add_space(6.0);

        // Friendly note banner
        let (fill, edge, ink) = if over {
            (Color32::from_rgb(254, 242, 242), Color32::from_rgb(239, 68, 68), BAD)
        } else {
            (Color32::from_rgb(240, 253, 244), Color32::from_rgb(34, 197, 94), GOOD)
        };
        egui::Frame::new()
            .fill(fill)
            .stroke(Stroke::new(2.0, edge))
            .inner_margin(Margin::same(16))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(&result.friendly_note).size(19.0).strong().color(ink));
                let detail = if over {
                    format!(
                        "I've estimated your total to be around {}. That's {} more than your budget of {}.",
                        format_money(result.estimated_total, currency),
                        format_money(gap, currency),
                        format_money(budget, currency),
                    )
                } else {
                    format!(
                        "I've estimated your total to be around {}. You're within your {} budget by {}! Excellent planning.",
                        format_money(result.estimated_total, currency),
                        format_money(budget, currency),
                        format_money(gap, currency),
                    )
                };
                ui.label(RichText::new(detail).color(INK));
                if let Some(confidence) = result.confidence {
                    ui.label(
                        RichText::new(format!("Confidence: {:.0}%", confidence.clamp(0.0, 1.0) * 100.0))
                            .small()
                            .color(MUTED),
                    );
                }
            });

        ui.add_space(10.0);

        ui.columns(2, |cols| {
            card(&mut cols[0], |ui| {
                ui.heading(RichText::new("☰ Estimated Breakdown").color(INK));
                items_table(ui, result);
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(RichText::new("ESTIMATED TOTAL").strong().color(INK));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(format_money(result.estimated_total, currency))
                                .size(22.0)
                                .strong()
                                .color(ACCENT),
                        );
                    });
                });
            });

            card(&mut cols[1], |ui| {
                ui.heading(RichText::new("◔ Spending Distribution").color(INK));
                spending_chart(ui, result);
            });
        });

        ui.add_space(10.0);

        egui::Frame::new()
            .fill(ACCENT)
            .inner_margin(Margin::same(16))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(
                    RichText::new("⚡ Smart Shopping Tips for You")
                        .size(18.0)
                        .strong()
                        .color(Color32::WHITE),
                );
                if result.savings_tips.is_empty() {
                    ui.label(RichText::new("No extra tips this time.").color(Color32::from_rgb(224, 231, 255)));
                }
                for tip in &result.savings_tips {
                    ui.label(RichText::new(format!("✨ {tip}")).color(Color32::from_rgb(224, 231, 255)));
                }
            });

        if !result.category_analysis.is_empty() {
            ui.add_space(10.0);
            egui::Frame::new()
                .fill(Color32::from_rgb(255, 251, 235))
                .stroke(Stroke::new(1.0, Color32::from_rgb(253, 230, 138)))
                .inner_margin(Margin::same(16))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(RichText::new("Did You Know?").strong().color(Color32::from_rgb(146, 64, 14)));
                    ui.label(
                        RichText::new(format!("\"{}\"", result.category_analysis))
                            .italics()
                            .color(Color32::from_rgb(180, 83, 9)),
                    );
                });
        }

        if go_back {
            self.reset();
        }
    }

    fn history_ui(&mut self, ui: &mut egui::Ui) {
        if self.history.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.label(RichText::new("🕒").size(60.0).color(MUTED));
                ui.add_space(10.0);
                ui.label(RichText::new("No predictions yet").size(20.0).strong().color(INK));
                ui.label(RichText::new("Your past shopping lists will appear here.").color(MUTED));
            });
            return;
        }

        ui.horizontal(|ui| {
            ui.label(RichText::new("🔎").color(MUTED));
            ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Search past lists or categories...")
                    .desired_width(320.0),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button(RichText::new("Clear History").color(BAD)).clicked() {
                    self.confirm_clear = true;
                }
            });
        });

        for summary in summarize(self.history.entries()) {
            ui.label(RichText::new(summary_line(&summary)).small().color(MUTED));
            ui.label(RichText::new(category_line(&summary)).small().color(MUTED));
        }

        ui.add_space(6.0);

        let mut open = None;
        let mut delete = None;
        let matches = self.history.search(&self.search);

        if matches.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);
                ui.label(
                    RichText::new(format!("No history found matching \"{}\"", self.search)).color(MUTED),
                );
            });
        }

        for entry in &matches {
            card(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format_date(entry.timestamp)).small().color(MUTED));
                    ui.label(
                        RichText::new(entry.form_data.category.label())
                            .small()
                            .strong()
                            .color(ACCENT),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("🗑").on_hover_text("Delete entry").clicked() {
                            delete = Some(entry.id.clone());
                        }
                    });
                });
                ui.label(RichText::new(&entry.form_data.bill_details).color(INK));
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Predicted Total").small().color(MUTED));
                    ui.label(
                        RichText::new(format_money(entry.result.estimated_total, &entry.result.currency))
                            .strong()
                            .color(ACCENT),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("View Results").clicked() {
                            open = Some(entry.id.clone());
                        }
                    });
                });
            });
            ui.add_space(6.0);
        }

        if let Some(id) = delete {
            self.history.remove(&id);
        }
        if let Some(id) = open {
            self.open_entry(&id);
        }
    }

    fn confirm_clear_ui(&mut self, ctx: &Context) {
        if !self.confirm_clear {
            return;
        }
        egui::Window::new("Clear history?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Are you sure you want to clear your entire prediction history?");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button(RichText::new("Clear").color(BAD).strong()).clicked() {
                        self.history.clear();
                        self.confirm_clear = false;
                    }
                    if ui.button("Cancel").clicked() {
                        self.confirm_clear = false;
                    }
                });
            });
    }
}

impl eframe::App for ShopWiseApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_prediction();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading(RichText::new("🛒 ShopWise AI").color(ACCENT).strong().size(24.0));
                ui.label(RichText::new("Reliable • Friendly • Respectful").small().color(MUTED));
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let idle = self.shown.is_none() && !self.slot.is_busy();

                if idle {
                    self.tab_bar(ui);
                    ui.add_space(8.0);
                }

                if idle && self.tab == Tab::Predict {
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("Hello there! Ready to plan?").size(28.0).strong().color(INK));
                        ui.label(
                            RichText::new("I can help you predict the cost of your shopping trip before you even step out.")
                                .color(MUTED),
                        );
                    });
                    ui.add_space(10.0);
                }

                self.error_banner(ui);

                match self.tab {
                    Tab::Predict if self.shown.is_some() => self.result_ui(ui),
                    Tab::Predict => self.form_ui(ui),
                    Tab::History => self.history_ui(ui),
                }
            });
        });

        self.confirm_clear_ui(ctx);

        if self.slot.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

fn card<R>(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui) -> R) -> R {
    egui::Frame::new()
        .fill(Color32::WHITE)
        .stroke(Stroke::new(1.0, Color32::from_rgb(226, 232, 240)))
        .inner_margin(Margin::same(14))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            add_contents(ui)
        })
        .inner
}

fn items_table(ui: &mut egui::Ui, result: &PredictionResult) {
    if result.items.is_empty() {
        ui.label(RichText::new("No individual items were listed.").color(MUTED));
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::remainder().at_least(140.0).clip(true)) // Item
        .column(Column::exact(90.0)) // Quantity
        .column(Column::exact(100.0)) // Price
        .header(26.0, |mut header| {
            header.col(|ui| {
                ui.label(RichText::new("Item").strong().color(MUTED));
            });
            header.col(|ui| {
                ui.label(RichText::new("Qty").strong().color(MUTED));
            });
            header.col(|ui| {
                ui.label(RichText::new("Price").strong().color(MUTED));
            });
        })
        .body(|body| {
            body.rows(28.0, result.items.len(), |mut row| {
                let item = &result.items[row.index()];
                row.col(|ui| {
                    ui.label(RichText::new(&item.name).color(INK).strong());
                });
                row.col(|ui| {
                    ui.label(RichText::new(item.quantity.to_uppercase()).small().color(MUTED));
                });
                row.col(|ui| {
                    ui.label(
                        RichText::new(format_money(item.estimated_price, &result.currency))
                            .strong()
                            .color(ACCENT),
                    );
                });
            });
        });
}

fn spending_chart(ui: &mut egui::Ui, result: &PredictionResult) {
    let bars: Vec<Bar> = result
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Bar::new(i as f64, item.estimated_price)
                .name(&item.name)
                .fill(CHART_COLORS[i % CHART_COLORS.len()])
                .width(0.7)
        })
        .collect();

    Plot::new("spending")
        .height(260.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show_x(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new("Items", bars));
        });

    ui.horizontal_wrapped(|ui| {
        for (i, item) in result.items.iter().enumerate() {
            ui.label(RichText::new("■").color(CHART_COLORS[i % CHART_COLORS.len()]));
            ui.label(RichText::new(&item.name).small().color(INK));
        }
    });
}

fn copy_text(request: &PredictionRequest, result: &PredictionResult) -> String {
    let mut text = format!(
        "{} ({}):\nBudget: {}\nEstimated total: {}\n",
        request.category,
        request.bill_details.trim(),
        format_money(request.budget, &result.currency),
        format_money(result.estimated_total, &result.currency),
    );
    for item in &result.items {
        text.push_str(&format!(
            "- {} [{}]: {}\n",
            item.name,
            item.quantity,
            format_money(item.estimated_price, &result.currency)
        ));
    }
    text
}

fn format_money(value: f64, currency: &str) -> String {
    let amount = if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    };
    match currency_code(currency).as_str() {
        "INR" => format!("₹{amount}"),
        other => format!("{other} {amount}"),
    }
}

fn summary_line(summary: &HistorySummary) -> String {
    let currency = summary.currency.as_str();
    format!(
        "{} predictions in {currency} • average {} • median {} • {} over budget",
        summary.count,
        format_money(summary.mean_total, currency),
        format_money(summary.median_total, currency),
        summary.over_budget,
    )
}

fn category_line(summary: &HistorySummary) -> String {
    let parts: Vec<String> = summary
        .total_by_category
        .iter()
        .map(|(category, total)| format!("{category} {}", format_money(*total, &summary.currency)))
        .collect();
    parts.join(" • ")
}

fn format_date(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%d %b %Y, %H:%M").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BudgetStatus, ShoppingItem};

    #[test]
    fn money_formats_by_currency() {
        assert_eq!(format_money(850.0, "INR"), "₹850");
        assert_eq!(format_money(99.5, "INR"), "₹99.50");
        assert_eq!(format_money(12.0, "USD"), "USD 12");
        assert_eq!(format_money(5.0, "₹"), "₹5");
    }

    #[test]
    fn summary_lines_use_each_summary_currency() {
        let summary = HistorySummary {
            currency: "USD".into(),
            count: 2,
            mean_total: 30.0,
            median_total: 30.0,
            over_budget: 1,
            total_by_category: [("Electronics".to_string(), 40.0), ("Groceries".to_string(), 20.0)]
                .into_iter()
                .collect(),
        };
        assert_eq!(
            summary_line(&summary),
            "2 predictions in USD • average USD 30 • median USD 30 • 1 over budget"
        );
        assert_eq!(category_line(&summary), "Electronics USD 40 • Groceries USD 20");
        assert!(!summary_line(&summary).contains('₹'));
    }

    #[test]
    fn copy_text_lists_items() {
        let request = PredictionRequest::new(1000.0, ShoppingCategory::Groceries, " 2kg rice ");
        let result = PredictionResult {
            estimated_total: 650.0,
            currency: "INR".into(),
            confidence: None,
            category_analysis: String::new(),
            items: vec![ShoppingItem {
                name: "Basmati Rice".into(),
                quantity: "2kg".into(),
                estimated_price: 650.0,
            }],
            savings_tips: vec![],
            friendly_note: String::new(),
            budget_status: BudgetStatus::Under,
        };
        let text = copy_text(&request, &result);
        assert!(text.starts_with("Groceries (2kg rice):"));
        assert!(text.contains("Budget: ₹1000"));
        assert!(text.contains("- Basmati Rice [2kg]: ₹650"));
    }

    #[test]
    fn invalid_timestamp_formats_empty() {
        assert_eq!(format_date(i64::MAX), "");
        assert!(!format_date(1_700_000_000_000).is_empty());
    }
}
