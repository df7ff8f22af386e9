//! The two report decks: the monthly realtime forecast and the hindcast skill assessment.

use super::{Picture, Rect, Slide, SlideDeck, TextBox};
use crate::{config::ReportConfig, render::chart_path, time_window::ForecastMonth};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const TITLE_RED: (u8, u8, u8) = (255, 0, 0);
const CAPTION_PT: f64 = 18.0;
const LINE_SPACING: f64 = 1.5;

/// Realtime slides in order: title, plot name, picture width in inches.
const REALTIME_SLIDES: [(&str, &str, f64); 18] = [
    ("Niño3.4 index", "nino34", 6.0),
    ("Niño3 index", "nino3", 6.0),
    ("Niño4 index", "nino4", 6.0),
    ("Niño1+2 index", "nino12", 6.0),
    ("SSTA along the equatorial Pacific", "ssta_evolution", 4.0),
    ("EMI", "emi", 6.0),
    ("DMI", "dmi", 6.0),
    ("WIO", "wio", 6.0),
    ("EIO", "eio", 6.0),
    ("SSTA", "ssta_global", 8.0),
    ("HGT&UV 850hPa", "hgtuv850_global", 8.0),
    ("HGT&UV 500hPa", "hgtuv500_global", 8.0),
    ("HGT&UV 200hPa", "hgtuv200_global", 8.0),
    ("Precipitation over Land", "precip_land", 8.0),
    ("Precipitation over Ocean", "precip_ocean", 8.0),
    ("Temperature over Land", "temp_land", 8.0),
    ("Precipitation over China", "precip_china", 8.0),
    ("Temperature over China", "temp_china", 8.0),
];

/// Placeholder caption until forecasters write the discussion.
const NO_DISCUSSION: &str = "暂无";

/// A skill slide: title, file in the result directory, width, fixed height, caption top,
/// caption.
struct SkillSlide {
    title: &'static str,
    file: &'static str,
    width: f64,
    height: Option<f64>,
    caption_top: f64,
    caption: &'static str,
}

const SKILL_SLIDES: [SkillSlide; 7] = [
    SkillSlide {
        title: "ACC & RMSE of Niño3.4 index",
        file: "f4_ACC_RMSE_nino34.svg",
        width: 8.0,
        height: None,
        caption_top: 6.0,
        caption: "以1982-2010年为参考期，计算Niño3.4指数的ACC和RMSE：\nFGOALS-g3预测系统能够提前10个月预测ENSO事件，ACC>0.6。",
    },
    SkillSlide {
        title: "Time series of Niño3.4 index",
        file: "f9_Nino34_TCC.svg",
        width: 5.0,
        height: Some(5.0),
        caption_top: 6.0,
        caption: "以1982-2023年为参考期，计算Niño3.4指数的ACC：\nFGOALS-g3预测系统提前8个月预测ENSO事件，ACC>0.6。",
    },
    SkillSlide {
        title: "PCC of SSTA",
        file: "f8_Nino34_PCC.svg",
        width: 9.0,
        height: None,
        caption_top: 6.0,
        caption: "以1982-2023年为参考期，逐格点计算SSTA的ACC：\nFGOALS-g3预测系统提前8个月在赤道中太平洋具有一定预测技巧，ACC>0.5。",
    },
    SkillSlide {
        title: "SPB of Niño3.4 index",
        file: "f10_Nino34_SPB.svg",
        width: 9.0,
        height: None,
        caption_top: 6.0,
        caption: "以1982-2023年为参考期，计算Niño3.4指数的春季预报障碍（SPB）：\nFGOALS-g3预测系统存在明显的春季预报障碍。",
    },
    SkillSlide {
        title: "PCC of ocean temperature",
        file: "f33_thetao_PCC.svg",
        width: 8.0,
        height: Some(5.0),
        caption_top: 5.7,
        caption: "以1982-2023年为参考期，逐格点计算5°S-5°N平均的海洋温度ACC：\nFGOALS-g3预测系统在赤道中西太平洋上层300m预测技巧较高，\n东太平洋预测技巧相对较低。",
    },
    SkillSlide {
        title: "FGOALS-g3 vs OBS",
        file: "f1_model_bias.svg",
        width: 6.0,
        height: None,
        caption_top: 6.5,
        caption: "FGOALS-g3预测系统海温气候态偏差。",
    },
    SkillSlide {
        title: "Niño3.4 index initialization",
        file: "f3_initalization_nino34.svg",
        width: 8.0,
        height: None,
        caption_top: 5.7,
        caption: "FGOALS-g3预测系统初始化Niño3.4指数评估。",
    },
];

/// Closing page of the skill deck: top of each box and its text.
const SKILL_CLOSING: [(f64, &str); 5] = [
    (0.5, "观测海表温度资料：HadISST \n https://www.metoffice.gov.uk/hadobs/hadisst/data/download.html"),
    (1.5, "NMME模式预报结果来源：\n https://www.cpc.ncep.noaa.gov/products/NMME/current/plume.html"),
    (3.5, "气候态参考期：1982-2010年 或 1991-2020年"),
    (4.0, "初始化：SST-Nudging（全场SST初始化、异常场SSTA初始化）"),
    (4.5, "成员数：8个成员"),
];

/// `realtime_report_<YYYY>_<MM>.pptx` in `dir`.
pub fn realtime_deck_path(dir: &Path, anchor: ForecastMonth) -> PathBuf {
    dir.join(format!("realtime_report_{}.pptx", anchor.file_tag()))
}

/// `prediction_skill_report.pptx` in `dir`.
pub fn skill_deck_path(dir: &Path) -> PathBuf {
    dir.join("prediction_skill_report.pptx")
}

/// The realtime forecast deck for `anchor`: a title page and one slide per chart.
pub fn realtime_deck(config: &ReportConfig, anchor: ForecastMonth, issued: NaiveDate) -> SlideDeck {
    let subtitle = format!("{}年{}月预报结果", anchor.year(), anchor.month());
    let mut deck = SlideDeck::new(config.deck_title().replace('\n', ""))
        .with_author(config.deck.authors.clone());
    deck.push(title_page(config, &subtitle, issued));

    let pic_dir = config.output.pic_dir.as_path();
    for (page, (title, plot_name, width)) in REALTIME_SLIDES.iter().enumerate() {
        let path = chart_path(pic_dir, plot_name, anchor);

        // The section is tall and narrow, its caption goes beside it
        let (picture, caption_rect) = if *plot_name == "ssta_evolution" {
            (
                Picture::centered(path, *width).at(1.0, 1.0),
                Rect::new(5.5, 1.5, 4.0, 5.0),
            )
        } else {
            (Picture::centered(path, *width), Rect::new(0.3, 6.0, 8.0, 0.5))
        };

        deck.push(Slide {
            title: Some((*title).to_owned()),
            picture: Some(picture),
            caption: Some(caption(caption_rect, NO_DISCUSSION)),
            page_number: Some(page + 1),
            texts: vec![],
        });
    }

    deck
}

/// The hindcast skill deck: a title page, one slide per skill figure and a closing page with
/// data sources and contact.
pub fn skill_deck(config: &ReportConfig, issued: NaiveDate) -> SlideDeck {
    let mut deck = SlideDeck::new(config.deck_title().replace('\n', ""))
        .with_author(config.deck.authors.clone());
    deck.push(title_page(config, "预测技巧评估报告", issued));

    let result_dir = config.skill.result_dir.as_path();
    for (page, slide) in SKILL_SLIDES.iter().enumerate() {
        let mut picture = Picture::centered(result_dir.join(slide.file), slide.width);
        if let Some(height) = slide.height {
            picture = picture.with_height(height);
        }

        deck.push(Slide {
            title: Some(slide.title.to_owned()),
            picture: Some(picture),
            caption: Some(caption(
                Rect::new(0.3, slide.caption_top, 8.0, 0.5),
                slide.caption,
            )),
            page_number: Some(page + 1),
            texts: vec![],
        });
    }

    let mut texts: Vec<TextBox> = SKILL_CLOSING
        .iter()
        .map(|(top, text)| caption(Rect::new(0.3, *top, 8.0, 0.5), text))
        .collect();
    if !config.deck.contact.is_empty() {
        texts.push(caption(Rect::new(0.3, 6.0, 8.0, 0.5), &config.deck.contact));
    }
    deck.push(Slide {
        page_number: Some(SKILL_SLIDES.len() + 1),
        texts,
        ..Slide::default()
    });

    deck
}

fn caption(rect: Rect, text: &str) -> TextBox {
    TextBox::new(rect, text, CAPTION_PT).with_line_spacing(LINE_SPACING)
}

fn title_page(config: &ReportConfig, subtitle: &str, issued: NaiveDate) -> Slide {
    let (r, g, b) = TITLE_RED;
    let mut texts = vec![
        TextBox::new(Rect::new(1.0, 0.8, 8.0, 1.5), config.deck_title(), 40.0)
            .bold()
            .centered()
            .with_line_spacing(LINE_SPACING),
        TextBox::new(Rect::new(1.0, 3.5, 8.0, 1.8), subtitle, 32.0)
            .bold()
            .with_color(r, g, b)
            .centered(),
    ];

    let byline: Vec<&str> = [config.deck.authors.as_str(), config.deck.affiliation.as_str()]
        .iter()
        .copied()
        .filter(|s| !s.is_empty())
        .collect();
    if !byline.is_empty() {
        texts.push(
            TextBox::new(Rect::new(1.0, 5.0, 8.0, 1.8), byline.join("\n"), CAPTION_PT)
                .centered()
                .with_line_spacing(LINE_SPACING),
        );
    }

    texts.push(
        TextBox::new(
            Rect::new(1.0, 6.5, 8.0, 1.8),
            issued.format("%Y.%m.%d").to_string(),
            CAPTION_PT,
        )
        .centered(),
    );

    Slide {
        texts,
        ..Slide::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::deck::Placement;

    fn issued() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_realtime_deck() {
        let config = ReportConfig::default();
        let anchor = ForecastMonth::new(2024, 3).unwrap();
        let deck = realtime_deck(&config, anchor, issued());

        assert_eq!(deck.len(), 19);
        let titles: Vec<&str> = deck.slides()[1..]
            .iter()
            .map(|s| s.title.as_deref().unwrap())
            .collect();
        assert_eq!(titles[0], "Niño3.4 index");
        assert_eq!(titles[4], "SSTA along the equatorial Pacific");
        assert_eq!(titles[17], "Temperature over China");

        let first = &deck.slides()[1];
        assert_eq!(
            first.picture.as_ref().unwrap().path,
            PathBuf::from("./pic/nino34_2024_03.svg")
        );
        assert_eq!(first.page_number, Some(1));
        assert_eq!(first.caption.as_ref().unwrap().text, "暂无");

        let section = &deck.slides()[5];
        assert!(matches!(
            section.picture.as_ref().unwrap().placement,
            Placement::At { .. }
        ));
        assert_eq!(section.caption.as_ref().unwrap().rect.left.0, 5.5);

        let cover = &deck.slides()[0];
        assert!(cover.title.is_none());
        assert!(cover.page_number.is_none());
        let cover_text: Vec<&str> = cover.texts.iter().map(|t| t.text.as_str()).collect();
        assert!(cover_text.contains(&"2024年3月预报结果"));
        assert!(cover_text.contains(&"2024.03.15"));
        assert!(cover_text[0].contains("FGOALS-g3"));
        // No authors configured, no byline
        assert_eq!(cover.texts.len(), 3);

        assert_eq!(
            realtime_deck_path(Path::new("."), anchor),
            PathBuf::from("./realtime_report_2024_03.pptx")
        );
    }

    #[test]
    fn test_skill_deck() {
        let mut config = ReportConfig::default();
        config.deck.authors = "A. Author".to_owned();
        config.deck.contact = "contact: someone@example.com".to_owned();
        let deck = skill_deck(&config, issued());

        assert_eq!(deck.len(), 9);
        assert_eq!(deck.images().len(), 7);
        assert!(deck.images()[3].ends_with("f10_Nino34_SPB.svg"));
        assert_eq!(deck.slides()[0].texts.len(), 4);

        let thetao = &deck.slides()[5];
        assert_eq!(thetao.title.as_deref(), Some("PCC of ocean temperature"));
        assert_eq!(thetao.picture.as_ref().unwrap().height.unwrap().0, 5.0);
        assert_eq!(thetao.caption.as_ref().unwrap().rect.top.0, 5.7);

        let closing = &deck.slides()[8];
        assert!(closing.picture.is_none());
        assert_eq!(closing.texts.len(), 6);
        assert_eq!(closing.page_number, Some(8));
    }
}
