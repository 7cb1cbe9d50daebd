//! The per-document extraction pipeline.
//!
//! Stage order:
//!
//! 1. input validation
//! 2. quote detection (dialogue ranges feed mention collection)
//! 3. mention collection + evidence accumulation
//! 4. alias merging, learned-pattern application, quality filtering
//! 5. coreference
//! 6. quote attribution
//! 7. relation extraction (dep, surface, fiction) and normalization
//! 8. correction replay
//! 9. pattern mining from the replayed corrections
//!
//! The pipeline holds no per-document state of its own; everything lives
//! in the run-local arena (candidates, spans, salience stack) and is
//! discarded on return or cancel.

use prose_graph::{
    AttributedQuote, Correction, Entity, EntitySpan, ExtractError, ExtractResult, KnowledgeGraph,
    ParseResponse, TextSpan, Tier,
};
use prose_graph_coref::{
    attribute_quotes, detect_quotes, CorefEngine, CorefLink, EntityDirectory, ReferenceResolver,
};
use prose_graph_corrections::{OverrideManager, PatternStore, ReplayConflict};
use prose_graph_entities::{
    collect_mentions, merge_candidates, EvidenceAccumulator, FilterOutcome, PromotionLevel,
    QualityFilter,
};
use prose_graph_relations::{
    extract_dep_relations, extract_dialogue_relations, extract_family_relations,
    extract_place_anaphora, extract_surface_relations, AnchorIndex, LinkAnchor,
    NormalizerConfig, PatternLibrary, RawRelation, RelationNormalizer,
};
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::config::PipelineConfig;
use crate::stats::PipelineStats;

/// Everything a document run returns to the caller.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub graph: KnowledgeGraph,
    pub links: Vec<CorefLink>,
    pub quotes: Vec<AttributedQuote>,
    pub stats: PipelineStats,
    pub conflicts: Vec<ReplayConflict>,
}

/// The document pipeline: immutable configuration plus the loaded
/// pattern library. Documents are processed independently; only the
/// learned-pattern store is shared and mutable, and the caller passes it
/// in explicitly.
#[derive(Debug)]
pub struct DocumentPipeline {
    config: PipelineConfig,
    library: PatternLibrary,
}

impl DocumentPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let library = match (&config.patterns_dir, config.dynamic_patterns) {
            (Some(dir), true) => PatternLibrary::load_dir(
                dir,
                config.patterns_mode,
                prose_graph_relations::DEFAULT_FAMILIES,
            ),
            _ => PatternLibrary::builtin(),
        };
        Self { config, library }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one document.
    ///
    /// Pure with respect to its inputs: the same `(parse, text,
    /// corrections)` always produces the same graph, links and quotes.
    /// `created_at` stamps new records so replayed runs stay comparable.
    pub fn process(
        &self,
        doc_id: &str,
        text: &str,
        parse: &ParseResponse,
        corrections: &[Correction],
        pattern_store: &mut PatternStore,
        cancel: &CancellationToken,
        created_at: u64,
    ) -> ExtractResult<PipelineOutcome> {
        parse.validate(text)?;
        let mut stats = PipelineStats {
            sentences: parse.sentences.len() as u64,
            patterns_dropped_at_load: self.library.dropped as u64,
            ..Default::default()
        };

        // --- quote detection (ranges feed mention collection) ---
        let quotes = detect_quotes(text);
        stats.quotes_detected = quotes.len() as u64;
        let dialogue_ranges: Vec<TextSpan> = quotes
            .iter()
            .map(|q| TextSpan::new(q.start, q.end))
            .collect();

        // --- mention collection, sentence by sentence ---
        let mut accumulator = EvidenceAccumulator::new();
        for sentence in &parse.sentences {
            if cancel.is_cancelled() {
                return Err(ExtractError::Cancelled {
                    sentence_index: sentence.sentence_index,
                });
            }
            for mention in
                collect_mentions(std::slice::from_ref(sentence), &dialogue_ranges)
            {
                stats.mentions_collected += 1;
                accumulator.observe(&mention);
            }
        }

        // --- candidates: merge aliases, apply learned patterns ---
        let mut candidates = merge_candidates(accumulator.into_candidates());
        stats.candidates = candidates.len() as u64;

        let mut applications = Vec::with_capacity(candidates.len());
        for candidate in &mut candidates {
            let application =
                pattern_store.apply(&candidate.surface, candidate.entity_type, created_at);
            if let Some(application) = &application {
                stats.patterns_applied += 1;
                if let Some(canonical) = &application.new_canonical {
                    candidate.surface = canonical.clone();
                    candidate.normalized = prose_graph::normalize_name(canonical);
                }
                if let Some(entity_type) = application.new_type {
                    candidate.entity_type = entity_type;
                }
            }
            applications.push(application);
        }

        // --- quality filter ---
        let filter = QualityFilter::new()
            .with_strict(self.config.strict)
            .with_enabled(self.config.entity_filter);
        let mut entities: Vec<Entity> = Vec::new();
        let mut entity_spans: Vec<EntitySpan> = Vec::new();

        for (candidate, application) in candidates.iter().zip(&applications) {
            let level = PromotionLevel::decide(&candidate.signals, candidate.mention_count);
            let forced_reject = application.as_ref().map(|a| a.reject).unwrap_or(false);
            let outcome = if forced_reject {
                let mut entity =
                    Entity::new(candidate.entity_type, &candidate.surface, 0.0, created_at);
                entity.rejected = true;
                entity.quality_decision = Some(prose_graph::QualityDecision {
                    verdict: prose_graph::QualityVerdict::Rejected,
                    rule: "learned_pattern_reject".to_string(),
                    signals: candidate.signals.as_map(candidate.mention_count),
                    detail: application.as_ref().map(|a| a.pattern_id.clone()),
                });
                FilterOutcome::Reject(entity)
            } else {
                filter.apply(candidate, level, created_at)
            };

            match outcome {
                FilterOutcome::Keep(mut entity, spans) => {
                    apply_pattern_marks(&mut entity, application);
                    stats.entities_accepted += 1;
                    entity_spans.extend(spans);
                    entities.push(entity);
                }
                FilterOutcome::Reject(mut entity) => {
                    apply_pattern_marks(&mut entity, application);
                    stats.entities_rejected += 1;
                    if let Some(decision) = &entity.quality_decision {
                        PipelineStats::bump(&mut stats.rejections_by_rule, &decision.rule);
                    }
                    entities.push(entity);
                }
                FilterOutcome::Split(parts) => {
                    stats.entities_split += 1;
                    for (entity, spans) in parts {
                        stats.entities_accepted += 1;
                        entity_spans.extend(spans);
                        entities.push(entity);
                    }
                }
            }
        }
        entity_spans.sort_by_key(|s| (s.sentence_index, s.start));

        // --- coreference ---
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled { sentence_index: 0 });
        }
        let directory = EntityDirectory::from_entities(entities.iter().filter(|e| !e.rejected));
        let resolver = ReferenceResolver::new(self.config.resolver.clone());
        let engine = CorefEngine::new(resolver, self.config.salience.clone());
        let coref = engine.run(text, &parse.sentences, &entity_spans, &directory);
        stats.coref_links = coref.links.len() as u64;
        for refusal in &coref.refusals {
            PipelineStats::bump(
                &mut stats.coref_refusals_by_reason,
                &format!("{:?}", refusal.reason).to_lowercase(),
            );
            if self.config.coref_debug {
                debug!(surface = %refusal.surface, reason = ?refusal.reason, "coref refusal");
            }
        }

        // --- quote attribution ---
        let sentence_bounds: Vec<(usize, usize)> = parse
            .sentences
            .iter()
            .map(|s| (s.start, s.end))
            .collect();
        let mut stack = coref.stack;
        let resolver = ReferenceResolver::new(self.config.resolver.clone());
        let attribution = attribute_quotes(
            text,
            &quotes,
            &entity_spans,
            &coref.links,
            &directory,
            &resolver,
            &mut stack,
            &sentence_bounds,
        );
        stats.quotes_pattern = attribution.pattern_hits as u64;
        stats.quotes_pronoun = attribution.pronoun_hits as u64;
        stats.quotes_turn_taking = attribution.turn_taking_hits as u64;
        stats.quotes_unattributed = attribution.unattributed as u64;

        // --- relation extraction ---
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled { sentence_index: 0 });
        }
        let anchors = AnchorIndex::new(
            entity_spans.clone(),
            coref
                .links
                .iter()
                .map(|l| LinkAnchor {
                    start: l.start,
                    end: l.end,
                    entity_id: l.entity_id.clone(),
                })
                .collect(),
            entity_names(&entities),
        );
        let mut raw: Vec<RawRelation> = Vec::new();
        raw.extend(extract_dep_relations(
            text,
            &parse.sentences,
            &anchors,
            &self.library,
            doc_id,
        ));
        raw.extend(extract_surface_relations(
            text,
            &anchors,
            &self.library,
            doc_id,
            &sentence_bounds,
        ));
        raw.extend(extract_family_relations(
            text,
            &anchors,
            doc_id,
            &sentence_bounds,
        ));
        raw.extend(extract_place_anaphora(
            text,
            &parse.sentences,
            &anchors,
            doc_id,
        ));
        raw.extend(extract_dialogue_relations(
            &attribution.quotes,
            doc_id,
            text,
            &sentence_bounds,
        ));
        stats.raw_relations = raw.len() as u64;

        // --- normalization ---
        let normalizer = RelationNormalizer::new(
            NormalizerConfig {
                deduplicate: self.config.deduplicate,
                raw_keys: self.config.dedup_raw,
                debug: self.config.dedup_debug,
            },
            entities.iter().filter(|e| !e.rejected),
        );
        let normalized = normalizer.normalize(raw);
        stats.relations_emitted = normalized.relations.len() as u64;
        stats.duplicates_merged = normalized.duplicates_merged as u64;
        stats.dedup_ratio = normalized.dedup_ratio();
        for violation in &normalized.violations {
            PipelineStats::bump(
                &mut stats.violations_by_kind,
                &format!("{:?}", violation.kind).to_lowercase(),
            );
        }

        // --- assemble and replay ---
        let mut graph = KnowledgeGraph::new();
        graph.entities = entities;
        graph.relations = normalized.relations;
        graph.corrections = corrections.to_vec();

        let replay = OverrideManager::new().replay(&mut graph, corrections);
        stats.corrections_applied = replay.applied as u64;
        stats.corrections_skipped = replay.skipped as u64;

        // --- pattern mining for future runs ---
        for correction in corrections {
            pattern_store.learn_from(correction);
        }
        graph.learned_patterns = pattern_store.patterns().to_vec();
        graph.stamp_version(created_at, stats.to_map());

        info!(
            doc_id,
            entities = stats.entities_accepted,
            relations = stats.relations_emitted,
            links = stats.coref_links,
            "document processed"
        );

        Ok(PipelineOutcome {
            graph,
            links: coref.links,
            quotes: attribution.quotes,
            stats,
            conflicts: replay.conflicts,
        })
    }
}

/// Canonical and alias names of the accepted entities, for the anchor
/// index.
fn entity_names(entities: &[Entity]) -> Vec<(String, String, prose_graph::EntityType)> {
    let mut names = Vec::new();
    for entity in entities.iter().filter(|e| !e.rejected) {
        names.push((
            prose_graph::normalize_name(&entity.canonical),
            entity.id.clone(),
            entity.entity_type,
        ));
        for alias in &entity.aliases {
            names.push((
                prose_graph::normalize_name(alias),
                entity.id.clone(),
                entity.entity_type,
            ));
        }
    }
    names
}

fn apply_pattern_marks(
    entity: &mut Entity,
    application: &Option<prose_graph_corrections::PatternApplication>,
) {
    let Some(application) = application else { return };
    if let Some(confidence) = application.new_confidence {
        entity.confidence = confidence.clamp(0.0, 1.0);
        entity.tier = Tier::for_confidence(entity.confidence);
    }
    entity
        .attrs
        .insert("patternModified".to_string(), serde_json::json!(true));
    entity.attrs.insert(
        "patternId".to_string(),
        serde_json::json!(application.pattern_id),
    );
}
